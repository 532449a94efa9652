//! CSV format handling for session scripts and the session report
//!
//! This module centralizes all CSV format concerns, providing:
//! - ScriptRecord structure for deserialization
//! - Conversion from script rows to `CommandRecord`s
//! - Wallet and invoice table serialization
//!
//! All functions are pure (no file access) for easy testing.

use crate::types::{
    CommandRecord, CommandType, InvoiceId, SessionId, SessionSnapshot, StableflowError,
};
use csv::Writer;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::io::Write;
use std::str::FromStr;

/// Script row as read from CSV
///
/// Columns: op, session, collateral, debt, price, invoice. Every column after
/// `session` is optional; numeric fields stay strings until conversion so bad
/// values produce a precise message.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ScriptRecord {
    pub op: String,
    pub session: SessionId,
    pub collateral: Option<String>,
    pub debt: Option<String>,
    pub price: Option<String>,
    pub invoice: Option<String>,
}

fn present(field: &Option<String>) -> Option<&str> {
    field
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn parse_decimal(
    name: &str,
    field: &Option<String>,
    line: Option<u64>,
) -> Result<Option<Decimal>, StableflowError> {
    present(field)
        .map(|value| {
            Decimal::from_str(value).map_err(|_| StableflowError::ParseError {
                line,
                message: format!("Invalid {} '{}'", name, value),
            })
        })
        .transpose()
}

fn parse_invoice(
    field: &Option<String>,
    line: Option<u64>,
) -> Result<Option<InvoiceId>, StableflowError> {
    present(field)
        .map(|value| {
            value
                .parse::<InvoiceId>()
                .map_err(|_| StableflowError::ParseError {
                    line,
                    message: format!("Invalid invoice id '{}'", value),
                })
        })
        .transpose()
}

/// Convert a ScriptRecord to a CommandRecord
///
/// This function:
/// - Parses the op (case-insensitive) into a CommandType
/// - Parses the numeric columns that are present
/// - Checks that mint has collateral and debt and that pay has an invoice
///
/// Columns that the op does not use are ignored. `line` is only used for
/// error context.
pub fn convert_script_record(
    record: ScriptRecord,
    line: Option<u64>,
) -> Result<CommandRecord, StableflowError> {
    let op = match record.op.trim().to_lowercase().as_str() {
        "connect" => CommandType::Connect,
        "mint" => CommandType::Mint,
        "pay" => CommandType::Pay,
        _ => return Err(StableflowError::invalid_command(&record.op, line)),
    };

    let collateral = parse_decimal("collateral", &record.collateral, line)?;
    let debt = parse_decimal("debt", &record.debt, line)?;
    let price = parse_decimal("price", &record.price, line)?;
    let invoice = parse_invoice(&record.invoice, line)?;

    match op {
        CommandType::Connect => Ok(CommandRecord::connect(record.session)),
        CommandType::Mint => {
            let collateral = collateral.ok_or_else(|| {
                StableflowError::missing_field("mint", "collateral", record.session)
            })?;
            let debt = debt
                .ok_or_else(|| StableflowError::missing_field("mint", "debt", record.session))?;
            Ok(CommandRecord::mint(record.session, collateral, debt, price))
        }
        CommandType::Pay => {
            let invoice = invoice
                .ok_or_else(|| StableflowError::missing_field("pay", "invoice", record.session))?;
            Ok(CommandRecord::pay(record.session, invoice))
        }
    }
}

fn write_failed(what: &str, error: csv::Error) -> StableflowError {
    StableflowError::IoError {
        message: format!("Failed to write {}: {}", what, error),
    }
}

fn sorted(snapshots: &[SessionSnapshot]) -> Vec<&SessionSnapshot> {
    let mut sorted: Vec<&SessionSnapshot> = snapshots.iter().collect();
    sorted.sort_by_key(|snapshot| snapshot.session);
    sorted
}

/// Write one wallet row per session
///
/// Columns: session, connected, address, collateral, stable. Balances use
/// four decimal places; rows are sorted by session.
pub fn write_wallets_csv(
    snapshots: &[SessionSnapshot],
    output: &mut dyn Write,
) -> Result<(), StableflowError> {
    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["session", "connected", "address", "collateral", "stable"])
        .map_err(|e| write_failed("wallet header", e))?;

    for snapshot in sorted(snapshots) {
        let wallet = &snapshot.wallet;
        writer
            .write_record(&[
                snapshot.session.to_string(),
                wallet.connected.to_string(),
                wallet.address.clone().unwrap_or_default(),
                format!("{:.4}", wallet.collateral_balance),
                format!("{:.4}", wallet.stable_balance),
            ])
            .map_err(|e| write_failed("wallet record", e))?;
    }

    writer.flush()?;
    Ok(())
}

/// Write one invoice row per session and invoice
///
/// Columns: session, invoice, title, amount, status. Amounts use two decimal
/// places; rows are sorted by session, then invoice id.
pub fn write_invoices_csv(
    snapshots: &[SessionSnapshot],
    output: &mut dyn Write,
) -> Result<(), StableflowError> {
    let mut writer = Writer::from_writer(output);

    writer
        .write_record(["session", "invoice", "title", "amount", "status"])
        .map_err(|e| write_failed("invoice header", e))?;

    for snapshot in sorted(snapshots) {
        let mut invoices: Vec<_> = snapshot.invoices.iter().collect();
        invoices.sort_by_key(|invoice| invoice.id);

        for invoice in invoices {
            writer
                .write_record(&[
                    snapshot.session.to_string(),
                    invoice.id.to_string(),
                    invoice.title.clone(),
                    format!("{:.2}", invoice.amount),
                    invoice.status.to_string(),
                ])
                .map_err(|e| write_failed("invoice record", e))?;
        }
    }

    writer.flush()?;
    Ok(())
}

/// Write the wallet table, a blank line, then the invoice table
pub fn write_session_report(
    snapshots: &[SessionSnapshot],
    output: &mut dyn Write,
) -> Result<(), StableflowError> {
    write_wallets_csv(snapshots, output)?;
    output.write_all(b"\n")?;
    write_invoices_csv(snapshots, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{default_invoices, InvoiceStatus, Wallet};
    use rstest::rstest;

    fn script(op: &str, collateral: &str, debt: &str, price: &str, invoice: &str) -> ScriptRecord {
        let field = |s: &str| (!s.is_empty()).then(|| s.to_string());
        ScriptRecord {
            op: op.to_string(),
            session: 1,
            collateral: field(collateral),
            debt: field(debt),
            price: field(price),
            invoice: field(invoice),
        }
    }

    #[rstest]
    #[case::connect("connect", CommandRecord::connect(1))]
    #[case::connect_uppercase("CONNECT", CommandRecord::connect(1))]
    #[case::pay("pay", CommandRecord::pay(1, 101))]
    fn test_convert_simple_commands(#[case] op: &str, #[case] expected: CommandRecord) {
        let record = script(op, "", "", "", "101");
        assert_eq!(convert_script_record(record, Some(2)), Ok(expected));
    }

    #[rstest]
    #[case::with_price("3000", Some(Decimal::new(3000, 0)))]
    #[case::without_price("", None)]
    #[case::whitespace_price("   ", None)]
    fn test_convert_mint(#[case] price: &str, #[case] expected_price: Option<Decimal>) {
        let record = script("mint", " 0.1 ", "100", price, "");

        let command = convert_script_record(record, Some(2)).unwrap();

        assert_eq!(command.op, CommandType::Mint);
        assert_eq!(command.collateral, Some(Decimal::new(1, 1)));
        assert_eq!(command.debt, Some(Decimal::new(100, 0)));
        assert_eq!(command.price, expected_price);
    }

    #[rstest]
    #[case::unknown_op(script("burn", "", "", "", ""), "Invalid command 'burn' at line 4")]
    #[case::mint_without_debt(
        script("mint", "0.1", "", "", ""),
        "mint command for session 1 requires debt"
    )]
    #[case::mint_without_collateral(
        script("mint", "", "100", "", ""),
        "mint command for session 1 requires collateral"
    )]
    #[case::pay_without_invoice(
        script("pay", "", "", "", ""),
        "pay command for session 1 requires invoice"
    )]
    #[case::bad_decimal(
        script("mint", "lots", "100", "", ""),
        "CSV parse error at line 4: Invalid collateral 'lots'"
    )]
    #[case::bad_invoice(
        script("pay", "", "", "", "abc"),
        "CSV parse error at line 4: Invalid invoice id 'abc'"
    )]
    fn test_convert_errors(#[case] record: ScriptRecord, #[case] expected: &str) {
        let error = convert_script_record(record, Some(4)).unwrap_err();
        assert_eq!(error.to_string(), expected);
    }

    fn snapshot(
        session: SessionId,
        connected: bool,
        collateral: Decimal,
        stable: Decimal,
    ) -> SessionSnapshot {
        let mut wallet = Wallet::new(collateral, stable);
        if connected {
            wallet.connect("0x71...9A2");
        }
        SessionSnapshot {
            session,
            wallet,
            invoices: default_invoices(),
        }
    }

    #[test]
    fn test_write_wallets_sorted_with_four_decimals() {
        let snapshots = vec![
            snapshot(2, false, Decimal::new(25, 1), Decimal::ZERO),
            snapshot(1, true, Decimal::new(24, 1), Decimal::new(100, 0)),
        ];
        let mut output = Vec::new();

        write_wallets_csv(&snapshots, &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "session,connected,address,collateral,stable\n\
             1,true,0x71...9A2,2.4000,100.0000\n\
             2,false,,2.5000,0.0000\n"
        );
    }

    #[test]
    fn test_write_session_report_layout() {
        let mut paid = snapshot(1, true, Decimal::new(24, 1), Decimal::new(97, 0));
        paid.invoices[0].status = InvoiceStatus::Paid;
        let mut output = Vec::new();

        write_session_report(&[paid], &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "session,connected,address,collateral,stable\n\
             1,true,0x71...9A2,2.4000,97.0000\n\
             \n\
             session,invoice,title,amount,status\n\
             1,101,Coffee Subscription,3.00,paid\n\
             1,102,Discord Nitro Gift,7.50,pending\n\
             1,103,Server Hosting (Hr),0.85,pending\n"
        );
    }

    #[test]
    fn test_write_session_report_empty() {
        let mut output = Vec::new();

        write_session_report(&[], &mut output).unwrap();

        assert_eq!(
            String::from_utf8(output).unwrap(),
            "session,connected,address,collateral,stable\n\nsession,invoice,title,amount,status\n"
        );
    }
}
