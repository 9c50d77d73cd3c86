//! Output sinks for the enriched sales table.

use std::io::Write;

use tracing::info;

use crate::error::EtlError;
use crate::models::fact::EnrichedSalesLine;

/// A destination for the enriched table.
pub trait SalesSink {
    /// What a successful write reports back.
    ///
    /// A file sink might return the path written, a row sink the number of
    /// rows.
    type Output;

    /// Write every line to the destination.
    fn write(&mut self, lines: &[EnrichedSalesLine]) -> Result<Self::Output, EtlError>;
}

/// Newline-delimited JSON, one object per line with keys in output column
/// order.
#[derive(Debug)]
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    /// Sink writing into `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> SalesSink for JsonLinesSink<W> {
    /// Lines written.
    type Output = usize;

    fn write(&mut self, lines: &[EnrichedSalesLine]) -> Result<usize, EtlError> {
        for line in lines {
            serde_json::to_writer(&mut self.writer, line)
                .map_err(|e| EtlError::Sink(e.into()))?;
            self.writer.write_all(b"\n").map_err(EtlError::Sink)?;
        }
        self.writer.flush().map_err(EtlError::Sink)?;
        info!(lines = lines.len(), "wrote enriched sales as JSON lines");
        Ok(lines.len())
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use serde_json::Value;

    use super::*;
    use crate::geo::Region;
    use crate::models::fact::{OUTPUT_COLUMNS, SalesFactLine};
    use crate::rfm::Segment;

    fn line() -> EnrichedSalesLine {
        let day = NaiveDate::from_ymd_opt(1996, 7, 4).unwrap();
        EnrichedSalesLine {
            fact: SalesFactLine {
                order_id: 10248,
                order_date: day.and_hms_opt(0, 0, 0),
                shipped_date: None,
                customer_id: Some("ALFKI".into()),
                contact_name: Some("Maria Anders".into()),
                region: Region::Europe,
                country: Some("Germany".into()),
                country_iso3: Some("DEU".into()),
                employee_id: Some(5),
                employee_name: Some("Steven Buchanan".into()),
                product_id: 11,
                product_name: Some("Queso Cabrales".into()),
                category_id: Some(4),
                category_name: Some("Dairy Products".into()),
                supplier_id: Some(5),
                supplier_name: Some("Cooperativa de Quesos".into()),
                unit_price: dec!(14.0),
                quantity: 12,
                discount: dec!(0),
                revenue: dec!(168.0),
            },
            segment: Some(Segment::AtRisk),
        }
    }

    #[test]
    fn writes_one_object_per_line_in_column_order() {
        let mut sink = JsonLinesSink::new(Vec::new());
        let n = sink.write(&[line(), line()]).unwrap();
        assert_eq!(n, 2);

        let text = String::from_utf8(sink.into_inner()).unwrap();
        let rows: Vec<&str> = text.lines().collect();
        assert_eq!(rows.len(), 2);

        let obj: serde_json::Map<String, Value> = serde_json::from_str(rows[0]).unwrap();
        let keys: Vec<&str> = obj.keys().map(String::as_str).collect();
        // serde_json::Map is sorted unless preserve_order is on; compare as sets
        let mut expected = OUTPUT_COLUMNS.to_vec();
        expected.sort_unstable();
        let mut got = keys.clone();
        got.sort_unstable();
        assert_eq!(got, expected);
        assert_eq!(obj["Segment"], "At-Risk");
        assert_eq!(obj["Region"], "Europe");
        assert_eq!(obj["ShippedDate"], Value::Null);

        // raw text keeps declaration order
        let first = rows[0].find("\"OrderID\"").unwrap();
        let last = rows[0].find("\"Segment\"").unwrap();
        assert!(first < last);
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn io_failure_is_a_sink_error() {
        let err = JsonLinesSink::new(Broken).write(&[line()]).unwrap_err();
        assert!(matches!(err, EtlError::Sink(_)));
    }
}
