//! Contains subcommands for the hashprice binary.

mod run;
pub(crate) use run::RunCommand;

mod once;
pub(crate) use once::OnceCommand;

mod profiles;
pub(crate) use profiles::ProfilesCommand;

mod revenue;
pub(crate) use revenue::RevenueCommand;

mod blocks;
pub(crate) use blocks::BlocksCommand;

use serde::Serialize;
use std::io::{self, Write};

/// Writes each item as one line of JSON.
pub(crate) fn write_json_lines<T, W>(mut out: W, items: &[T]) -> io::Result<()>
where
    T: Serialize,
    W: Write,
{
    for item in items {
        serde_json::to_writer(&mut out, item)?;
        out.write_all(b"\n")?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashprice_primitives::RevenueAllocation;

    #[test]
    fn test_write_json_lines() {
        let rows = [
            RevenueAllocation {
                height: 1,
                profile_id: "a".into(),
                native_revenue: 0.5,
                reference_revenue: None,
                timestamp: 10,
            },
            RevenueAllocation {
                height: 2,
                profile_id: "a".into(),
                native_revenue: 0.25,
                reference_revenue: Some(1.5),
                timestamp: 20,
            },
        ];
        let mut out = Vec::new();
        write_json_lines(&mut out, &rows).unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(r#""reference_revenue":null"#));
        assert_eq!(serde_json::from_str::<RevenueAllocation>(lines[1]).unwrap(), rows[1]);
    }

    #[test]
    fn test_write_nothing() {
        let mut out = Vec::new();
        write_json_lines::<RevenueAllocation, _>(&mut out, &[]).unwrap();
        assert!(out.is_empty());
    }
}
