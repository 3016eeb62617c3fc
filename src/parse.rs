//! Row parsing seam and the default L3 CSV row format.

use crate::event::Sequenced;

/// Turns one raw data line into a domain event.
///
/// The header line never reaches a parser.
pub trait RowParser {
    type Event: Sequenced;

    fn parse(&self, line: &str) -> anyhow::Result<Self::Event>;
}

impl<E, F> RowParser for F
where
    E: Sequenced,
    F: Fn(&str) -> anyhow::Result<E>,
{
    type Event = E;

    fn parse(&self, line: &str) -> anyhow::Result<E> {
        self(line)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("missing field {0}")]
    MissingField(&'static str),
    #[error("invalid {field}: {value}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("invalid side: {0}")]
    InvalidSide(String),
    #[error("row carries no add, update, delete or trade order")]
    NoRequest,
    #[error("row carries {0} of add, update, delete and trade orders, expected one")]
    MultipleRequests(usize),
}

#[cfg(feature = "rows")]
pub use csv_rows::CsvL3RowParser;

#[cfg(feature = "rows")]
mod csv_rows {
    use csv::{ReaderBuilder, StringRecord, Trim};

    use super::{RowError, RowParser};
    use crate::event::{L3Order, L3Request, L3RequestKind, L3Side};

    const SEQ_NUM: usize = 0;
    const TIME: usize = 15;

    /// Column positions and names of one order group.
    struct Group {
        id: usize,
        id_name: &'static str,
        side_name: &'static str,
        price_name: &'static str,
        qty_name: &'static str,
    }

    const ADD: Group = Group {
        id: 1,
        id_name: "add_order_id",
        side_name: "add_side",
        price_name: "add_price",
        qty_name: "add_qty",
    };
    const UPDATE: Group = Group {
        id: 5,
        id_name: "update_order_id",
        side_name: "update_side",
        price_name: "update_price",
        qty_name: "update_qty",
    };
    const DELETE: Group = Group {
        id: 9,
        id_name: "delete_order_id",
        side_name: "delete_side",
        price_name: "",
        qty_name: "",
    };
    const TRADE: Group = Group {
        id: 11,
        id_name: "trade_order_id",
        side_name: "trade_side",
        price_name: "trade_price",
        qty_name: "trade_qty",
    };

    /// Parser for rows laid out as
    /// `seq_num,add_order_id,add_side,add_price,add_qty,update_order_id,update_side,
    /// update_price,update_qty,delete_order_id,delete_side,trade_order_id,trade_side,
    /// trade_price,trade_qty,time`.
    ///
    /// Exactly one of the add, update, delete and trade order ids must be set; it
    /// decides the request kind.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct CsvL3RowParser;

    impl CsvL3RowParser {
        pub fn new() -> Self {
            Self
        }

        pub fn parse_row(&self, line: &str) -> Result<L3Request, RowError> {
            let record = read_record(line)?;
            let seq = parse_u64(field(&record, SEQ_NUM, "seq_num")?, "seq_num")?;
            let time = record.get(TIME).unwrap_or("").to_string();

            let groups = [
                (L3RequestKind::New, &ADD),
                (L3RequestKind::Update, &UPDATE),
                (L3RequestKind::Cancel, &DELETE),
                (L3RequestKind::Trade, &TRADE),
            ];
            let mut found = None;
            let mut populated = 0;
            for (kind, group) in groups {
                if let Some(order_id) = order_id(&record, group)? {
                    populated += 1;
                    if found.is_none() {
                        found = Some((kind, group, order_id));
                    }
                }
            }
            if populated > 1 {
                return Err(RowError::MultipleRequests(populated));
            }
            let Some((kind, group, order_id)) = found else {
                return Err(RowError::NoRequest);
            };

            let side = parse_side(field(&record, group.id + 1, group.side_name)?)?;
            let order = match kind {
                L3RequestKind::Cancel => L3Order {
                    order_id,
                    side,
                    price: 0,
                    qty: 0,
                },
                _ => L3Order {
                    order_id,
                    side,
                    price: parse_fixed(
                        field(&record, group.id + 2, group.price_name)?,
                        group.price_name,
                        L3Order::PRICE_SCALE,
                    )?,
                    qty: parse_fixed(
                        field(&record, group.id + 3, group.qty_name)?,
                        group.qty_name,
                        L3Order::SIZE_SCALE,
                    )?,
                },
            };
            Ok(L3Request::new(seq, kind, order, time))
        }
    }

    impl RowParser for CsvL3RowParser {
        type Event = L3Request;

        fn parse(&self, line: &str) -> anyhow::Result<L3Request> {
            Ok(self.parse_row(line)?)
        }
    }

    fn read_record(line: &str) -> Result<StringRecord, RowError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(line.as_bytes());
        let mut record = StringRecord::new();
        match reader.read_record(&mut record) {
            Ok(true) => Ok(record),
            _ => Err(RowError::MissingField("seq_num")),
        }
    }

    fn field<'a>(
        record: &'a StringRecord,
        idx: usize,
        name: &'static str,
    ) -> Result<&'a str, RowError> {
        match record.get(idx) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(RowError::MissingField(name)),
        }
    }

    fn order_id(record: &StringRecord, group: &Group) -> Result<Option<u64>, RowError> {
        match record.get(group.id) {
            None | Some("") => Ok(None),
            Some(value) => parse_u64(value, group.id_name).map(Some),
        }
    }

    fn is_digits(value: &str) -> bool {
        value.bytes().all(|b| b.is_ascii_digit())
    }

    fn parse_u64(value: &str, field: &'static str) -> Result<u64, RowError> {
        let invalid = || RowError::InvalidNumber {
            field,
            value: value.to_string(),
        };
        if value.is_empty() || !is_digits(value) {
            return Err(invalid());
        }
        value.parse::<u64>().map_err(|_| invalid())
    }

    fn parse_side(value: &str) -> Result<L3Side, RowError> {
        if value.eq_ignore_ascii_case("buy") {
            Ok(L3Side::Buy)
        } else if value.eq_ignore_ascii_case("sell") {
            Ok(L3Side::Sell)
        } else {
            Err(RowError::InvalidSide(value.to_string()))
        }
    }

    fn parse_fixed(value: &str, field: &'static str, scale: u8) -> Result<u64, RowError> {
        let invalid = || RowError::InvalidNumber {
            field,
            value: value.to_string(),
        };
        let (int_part, frac_part) = value.split_once('.').unwrap_or((value, ""));
        if !is_digits(int_part) || !is_digits(frac_part) {
            return Err(invalid());
        }
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(invalid());
        }
        let frac_part = frac_part.trim_end_matches('0');
        if frac_part.len() > scale as usize {
            return Err(invalid());
        }

        let int_val = if int_part.is_empty() {
            0
        } else {
            int_part.parse::<u64>().map_err(|_| invalid())?
        };
        let frac_val = if frac_part.is_empty() {
            0
        } else {
            frac_part.parse::<u64>().map_err(|_| invalid())?
        };
        let pow10 = 10u64.pow(scale as u32);
        let frac_scaled = frac_val * 10u64.pow((scale as usize - frac_part.len()) as u32);
        int_val
            .checked_mul(pow10)
            .and_then(|v| v.checked_add(frac_scaled))
            .ok_or_else(invalid)
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::event::Sequenced;

        fn invalid(field: &'static str, value: &str) -> RowError {
            RowError::InvalidNumber {
                field,
                value: value.to_string(),
            }
        }

        #[test]
        fn parses_add_row() {
            let parser = CsvL3RowParser::new();
            let req = parser
                .parse_row("7,101,BUY,100.25,0.5,,,,,,,,,,,2024-05-01T09:30:00.000Z")
                .unwrap();
            assert_eq!(req.seq(), 7);
            assert_eq!(req.kind(), L3RequestKind::New);
            assert_eq!(req.order().order_id, 101);
            assert_eq!(req.order().side, L3Side::Buy);
            assert_eq!(req.order().price, 10_025_000_000);
            assert_eq!(req.order().qty, 50_000_000);
            assert_eq!(req.time(), "2024-05-01T09:30:00.000Z");
        }

        #[test]
        fn parses_update_cancel_and_trade_rows() {
            let parser = CsvL3RowParser::new();
            let update = parser.parse_row("3,,,,,42,SELL,101.5,3,,,,,,,t").unwrap();
            assert_eq!(update.kind(), L3RequestKind::Update);
            assert_eq!(update.order().order_id, 42);
            assert_eq!(update.order().price, 10_150_000_000);

            let cancel = parser.parse_row("8,,,,,,,,,101,sell,,,,,t").unwrap();
            assert_eq!(cancel.kind(), L3RequestKind::Cancel);
            assert_eq!(cancel.order().side, L3Side::Sell);
            assert_eq!(cancel.order().qty, 0);

            let trade = parser.parse_row("9,,,,,,,,,,,55,BUY,99,2,t").unwrap();
            assert_eq!(trade.kind(), L3RequestKind::Trade);
            assert_eq!(trade.order().price, 9_900_000_000);
            assert_eq!(trade.order().qty, 200_000_000);
        }

        #[test]
        fn rejects_rows_with_several_order_groups() {
            let parser = CsvL3RowParser::new();
            assert_eq!(
                parser.parse_row("1,1,BUY,1,1,2,SELL,2,2,,,,,,,t").unwrap_err(),
                RowError::MultipleRequests(2)
            );
            assert_eq!(
                parser.parse_row("1,,,,,,,,,7,BUY,7,SELL,1,1,t").unwrap_err(),
                RowError::MultipleRequests(2)
            );
        }

        #[test]
        fn rejects_bad_rows() {
            let parser = CsvL3RowParser::new();
            assert_eq!(
                parser.parse_row("x,1,BUY,1,1,,,,,,,,,,,t").unwrap_err(),
                invalid("seq_num", "x")
            );
            assert_eq!(
                parser.parse_row("+1,1,BUY,1,1,,,,,,,,,,,t").unwrap_err(),
                invalid("seq_num", "+1")
            );
            assert_eq!(
                parser.parse_row("1,1,HOLD,1,1,,,,,,,,,,,t").unwrap_err(),
                RowError::InvalidSide("HOLD".to_string())
            );
            assert_eq!(
                parser.parse_row("1,,,,,,,,,,,,,,,t").unwrap_err(),
                RowError::NoRequest
            );
            assert_eq!(
                parser.parse_row("1,1,BUY,,1,,,,,,,,,,,t").unwrap_err(),
                RowError::MissingField("add_price")
            );
            assert_eq!(
                parser.parse_row("1,1,BUY,1.+5,1,,,,,,,,,,,t").unwrap_err(),
                invalid("add_price", "1.+5")
            );
            assert_eq!(
                parser.parse_row("1,1,BUY,+1,1,,,,,,,,,,,t").unwrap_err(),
                invalid("add_price", "+1")
            );
        }

        #[test]
        fn fixed_point_rejects_excess_precision() {
            assert!(parse_fixed("1.123456789", "price", 8).is_err());
            assert!(parse_fixed(".", "price", 8).is_err());
            assert!(parse_fixed("1.2.3", "price", 8).is_err());
            assert_eq!(parse_fixed("1.10000000000", "price", 8).unwrap(), 110_000_000);
            assert_eq!(parse_fixed(".5", "qty", 8).unwrap(), 50_000_000);
        }
    }
}
