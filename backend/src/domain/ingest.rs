//! Portfolio file parsing and validation pipeline.
//!
//! Structural checks run first and fail fast: byte ceiling, file type,
//! emptiness, and the header row. Only when the structure is sound does
//! row validation run, and then **every** row error is collected so the
//! caller sees the full repair list in one pass. The format is a rigid
//! five-column CSV; quoting is not supported and rows wider than the
//! header are malformed rather than truncated.

use serde_json::json;

use crate::domain::error::{DomainError, ErrorCode};
use crate::domain::portfolio::{Position, RowError, RowFields};

/// Column names the header row must declare, in any order.
pub const REQUIRED_HEADERS: [&str; 5] =
    ["symbol", "quantity", "price", "trade_date", "equity_balance"];

/// Default upload ceiling: one mebibyte.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 1_048_576;

/// File extensions accepted for upload.
const CSV_EXTENSION: &str = ".csv";

/// Content types accepted for upload; octet-stream is tolerated because
/// browsers frequently send it for local files.
const ACCEPTED_CONTENT_TYPES: [&str; 3] = ["text/csv", "application/csv", "application/octet-stream"];

/// Structural limits applied before any parsing.
#[derive(Debug, Clone, Copy)]
pub struct UploadLimits {
    /// Hard ceiling on the upload size, in bytes.
    pub max_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

/// Check the declared file name and content type before reading bytes.
///
/// A missing file name or content type is tolerated; a present value that
/// contradicts CSV is rejected with [`ErrorCode::WrongFileType`].
pub fn check_file_type(
    filename: Option<&str>,
    content_type: Option<&str>,
) -> Result<(), DomainError> {
    if let Some(name) = filename
        && !name.to_lowercase().ends_with(CSV_EXTENSION)
    {
        return Err(DomainError::new(
            ErrorCode::WrongFileType,
            format!("expected a {CSV_EXTENSION} file, got {name:?}"),
        ));
    }
    if let Some(ct) = content_type {
        let essence = ct.split(';').next().unwrap_or(ct).trim().to_lowercase();
        if !ACCEPTED_CONTENT_TYPES.contains(&essence.as_str()) {
            return Err(DomainError::new(
                ErrorCode::WrongFileType,
                format!("content type {ct:?} is not a CSV type"),
            ));
        }
    }
    Ok(())
}

/// Parse and validate an uploaded portfolio file into position rows.
///
/// Runs the structural gauntlet, then validates every data row
/// independently. All-or-nothing: any row error means no positions are
/// returned.
pub fn parse_portfolio_csv(
    bytes: &[u8],
    limits: UploadLimits,
) -> Result<Vec<Position>, DomainError> {
    if bytes.len() > limits.max_bytes {
        return Err(DomainError::new(
            ErrorCode::FileTooLarge,
            format!(
                "upload is {} bytes; the ceiling is {} bytes",
                bytes.len(),
                limits.max_bytes
            ),
        ));
    }

    let text = std::str::from_utf8(bytes).map_err(|_| {
        DomainError::new(ErrorCode::WrongFileType, "file is not valid UTF-8 text")
    })?;

    let mut lines = text.lines().map(str::trim_end);
    let header_line = lines
        .by_ref()
        .find(|line| !line.trim().is_empty())
        .ok_or_else(|| DomainError::new(ErrorCode::EmptyFile, "file contains no rows"))?;

    let column_order = parse_header(header_line)?;

    let mut positions = Vec::new();
    let mut errors: Vec<RowError> = Vec::new();
    let mut row_number = 0usize;
    for line in lines {
        if line.trim().is_empty() {
            // Tolerate blank separator/trailing lines rather than
            // reporting phantom rows.
            continue;
        }
        row_number += 1;
        match split_row(line, &column_order, row_number) {
            Ok(fields) => match Position::from_fields(row_number, &fields) {
                Ok(position) => positions.push(position),
                Err(mut row_errors) => errors.append(&mut row_errors),
            },
            Err(row_error) => errors.push(row_error),
        }
    }

    if row_number == 0 {
        return Err(DomainError::new(
            ErrorCode::EmptyFile,
            "file contains a header but no data rows",
        ));
    }

    if errors.is_empty() {
        Ok(positions)
    } else {
        Err(rejection(errors))
    }
}

/// Wrap collected row errors in the taxonomy's list-bearing code.
fn rejection(errors: Vec<RowError>) -> DomainError {
    let count = errors.len();
    DomainError::new(
        ErrorCode::PositionValidationFailed,
        format!("{count} row error(s); no positions were committed"),
    )
    .with_details(json!({ "rows": errors }))
}

/// Map of required-column name to its index in the header.
#[derive(Debug, Clone)]
struct ColumnOrder {
    indices: [usize; REQUIRED_HEADERS.len()],
    width: usize,
}

fn parse_header(line: &str) -> Result<ColumnOrder, DomainError> {
    let names: Vec<String> = line
        .split(',')
        .map(|cell| cell.trim().to_lowercase())
        .collect();

    let mut indices = [0usize; REQUIRED_HEADERS.len()];
    let mut missing = Vec::new();
    for (slot, required) in REQUIRED_HEADERS.iter().enumerate() {
        match names.iter().position(|name| name == required) {
            Some(index) => {
                if let Some(target) = indices.get_mut(slot) {
                    *target = index;
                }
            }
            None => missing.push(*required),
        }
    }
    if !missing.is_empty() {
        return Err(DomainError::new(
            ErrorCode::MissingHeaders,
            format!("header row is missing required columns: {}", missing.join(", ")),
        )
        .with_details(json!({ "missing": missing })));
    }

    let unknown: Vec<&str> = names
        .iter()
        .map(String::as_str)
        .filter(|name| !REQUIRED_HEADERS.contains(name))
        .collect();
    if !unknown.is_empty() {
        return Err(DomainError::new(
            ErrorCode::MissingHeaders,
            format!("header row declares unknown columns: {}", unknown.join(", ")),
        )
        .with_details(json!({ "unknown": unknown })));
    }

    Ok(ColumnOrder {
        indices,
        width: names.len(),
    })
}

fn split_row<'a>(
    line: &'a str,
    order: &ColumnOrder,
    row_number: usize,
) -> Result<RowFields<'a>, RowError> {
    let cells: Vec<&str> = line.split(',').map(str::trim).collect();
    if cells.len() != order.width {
        return Err(RowError {
            row: row_number,
            code: ErrorCode::MalformedRow,
            message: format!(
                "expected {} columns, found {}",
                order.width,
                cells.len()
            ),
        });
    }
    let field = |slot: usize| -> &'a str {
        order
            .indices
            .get(slot)
            .and_then(|&index| cells.get(index))
            .copied()
            .unwrap_or_default()
    };
    Ok(RowFields {
        symbol: field(0),
        quantity: field(1),
        price: field(2),
        trade_date: field(3),
        equity_balance: field(4),
    })
}

#[cfg(test)]
mod tests {
    //! Structural and pipeline coverage for CSV ingestion.
    use super::*;
    use rstest::rstest;

    const VALID_CSV: &str = "symbol,quantity,price,trade_date,equity_balance\n\
                             VTI,10,220.35,2026-01-15,25000\n\
                             BND,25,72.10,2026-01-16,25000\n\
                             VXUS,12,61.80,2026-01-20,25000\n";

    fn parse(input: &str) -> Result<Vec<Position>, DomainError> {
        parse_portfolio_csv(input.as_bytes(), UploadLimits::default())
    }

    #[rstest]
    fn valid_file_commits_every_parsed_row() {
        let positions = parse(VALID_CSV).expect("file is valid");
        assert_eq!(positions.len(), 3);
        assert_eq!(positions.first().map(|p| p.symbol.as_str()), Some("VTI"));
    }

    #[rstest]
    fn headers_are_accepted_in_any_order() {
        let csv = "price,symbol,equity_balance,quantity,trade_date\n\
                   220.35,VTI,25000,10,2026-01-15\n";
        let positions = parse(csv).expect("reordered header is valid");
        assert_eq!(positions.first().map(|p| p.symbol.as_str()), Some("VTI"));
        assert!(positions
            .first()
            .map(|p| (p.price - 220.35).abs() < 1e-9)
            .unwrap_or(false));
    }

    #[rstest]
    fn oversized_upload_fails_fast() {
        let err = parse_portfolio_csv(VALID_CSV.as_bytes(), UploadLimits { max_bytes: 16 })
            .expect_err("over ceiling");
        assert_eq!(err.code(), ErrorCode::FileTooLarge);
    }

    #[rstest]
    #[case("")]
    #[case("\n\n  \n")]
    fn empty_file_is_rejected(#[case] input: &str) {
        let err = parse(input).expect_err("empty");
        assert_eq!(err.code(), ErrorCode::EmptyFile);
    }

    #[rstest]
    fn header_only_file_is_rejected_as_empty() {
        let err = parse("symbol,quantity,price,trade_date,equity_balance\n").expect_err("no rows");
        assert_eq!(err.code(), ErrorCode::EmptyFile);
    }

    #[rstest]
    #[case("symbol,quantity,price\nVTI,10,220.35\n")]
    #[case("symbol,quantity,price,trade_date,equity_balance,notes\nVTI,10,1,2026-01-15,1,hi\n")]
    fn wrong_header_set_is_rejected(#[case] input: &str) {
        let err = parse(input).expect_err("bad header");
        assert_eq!(err.code(), ErrorCode::MissingHeaders);
    }

    #[rstest]
    fn non_utf8_bytes_are_rejected_as_wrong_type() {
        let err = parse_portfolio_csv(&[0xff, 0xfe, 0x00, 0x41], UploadLimits::default())
            .expect_err("binary");
        assert_eq!(err.code(), ErrorCode::WrongFileType);
    }

    #[rstest]
    fn one_bad_row_rejects_the_whole_file_with_exactly_its_error() {
        let csv = "symbol,quantity,price,trade_date,equity_balance\n\
                   VTI,10,220.35,2026-01-15,25000\n\
                   BND,-5,72.10,2026-01-16,25000\n\
                   VXUS,12,61.80,2026-01-20,25000\n";
        let err = parse(csv).expect_err("one bad row");
        assert_eq!(err.code(), ErrorCode::PositionValidationFailed);
        let rows = err
            .details()
            .and_then(|d| d.get("rows"))
            .and_then(|r| r.as_array())
            .expect("row list present");
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows.first().and_then(|r| r.get("row")).and_then(serde_json::Value::as_u64),
            Some(2)
        );
        assert_eq!(
            rows.first()
                .and_then(|r| r.get("code"))
                .and_then(serde_json::Value::as_str),
            Some("invalid_quantity")
        );
    }

    #[rstest]
    fn over_wide_rows_are_malformed_not_truncated() {
        let csv = "symbol,quantity,price,trade_date,equity_balance\n\
                   VTI,10,220.35,2026-01-15,25000,extra\n";
        let err = parse(csv).expect_err("wide row");
        assert_eq!(err.code(), ErrorCode::PositionValidationFailed);
        let rows = err
            .details()
            .and_then(|d| d.get("rows"))
            .and_then(|r| r.as_array())
            .expect("row list present");
        assert_eq!(
            rows.first()
                .and_then(|r| r.get("code"))
                .and_then(serde_json::Value::as_str),
            Some("malformed_row")
        );
    }

    #[rstest]
    fn errors_from_multiple_rows_are_all_collected() {
        let csv = "symbol,quantity,price,trade_date,equity_balance\n\
                   ,10,220.35,2026-01-15,25000\n\
                   VTI,10,220.35,2026-01-15,25000\n\
                   BND,x,72.10,bad-date,25000\n";
        let err = parse(csv).expect_err("two bad rows");
        let rows = err
            .details()
            .and_then(|d| d.get("rows"))
            .and_then(|r| r.as_array())
            .expect("row list present");
        assert_eq!(rows.len(), 3);
    }

    #[rstest]
    #[case(Some("portfolio.csv"), Some("text/csv"))]
    #[case(Some("PORTFOLIO.CSV"), None)]
    #[case(None, Some("application/octet-stream"))]
    #[case(None, None)]
    fn acceptable_file_declarations_pass(
        #[case] filename: Option<&str>,
        #[case] content_type: Option<&str>,
    ) {
        check_file_type(filename, content_type).expect("accepted");
    }

    #[rstest]
    #[case(Some("portfolio.xlsx"), None)]
    #[case(Some("portfolio.csv"), Some("application/pdf"))]
    fn contradicting_file_declarations_fail(
        #[case] filename: Option<&str>,
        #[case] content_type: Option<&str>,
    ) {
        let err = check_file_type(filename, content_type).expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::WrongFileType);
    }
}
