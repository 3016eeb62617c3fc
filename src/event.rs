//! L3 (order-by-order) request model produced by the row parser.

/// Anything carrying the source sequence number used for resequencing.
pub trait Sequenced {
    fn seq(&self) -> u64;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum L3Side {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum L3RequestKind {
    New,
    Update,
    Cancel,
    Trade,
}

/// Order fields shared by every request kind.
///
/// `price` and `qty` are fixed-point with [`L3Order::PRICE_SCALE`] and
/// [`L3Order::SIZE_SCALE`] decimals. A cancel carries no price or size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L3Order {
    pub order_id: u64,
    pub side: L3Side,
    pub price: u64,
    pub qty: u64,
}

impl L3Order {
    pub const PRICE_SCALE: u8 = 8;
    pub const SIZE_SCALE: u8 = 8;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct L3Request {
    seq: u64,
    kind: L3RequestKind,
    order: L3Order,
    time: String,
}

impl L3Request {
    pub fn new(seq: u64, kind: L3RequestKind, order: L3Order, time: impl Into<String>) -> Self {
        Self {
            seq,
            kind,
            order,
            time: time.into(),
        }
    }

    pub fn kind(&self) -> L3RequestKind {
        self.kind
    }

    pub fn order(&self) -> &L3Order {
        &self.order
    }

    /// Source timestamp, kept verbatim.
    pub fn time(&self) -> &str {
        &self.time
    }
}

impl Sequenced for L3Request {
    fn seq(&self) -> u64 {
        self.seq
    }
}
