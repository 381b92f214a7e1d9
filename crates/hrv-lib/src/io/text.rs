use anyhow::{Context, Result};
use std::path::Path;

fn data_lines(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines()
        .enumerate()
        .map(|(idx, line)| (idx + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

/// Parse one value per line, skipping blank and `#` comment lines.
pub fn parse_f64_series(text: &str) -> Result<Vec<f64>> {
    let mut out = Vec::new();
    for (lineno, line) in data_lines(text) {
        let val: f64 = line
            .parse()
            .with_context(|| format!("line {lineno} is not a number: {line}"))?;
        out.push(val);
    }
    if out.is_empty() {
        anyhow::bail!("no numeric samples found");
    }
    Ok(out)
}

pub fn read_f64_series(path: &Path) -> Result<Vec<f64>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_f64_series(&text)
}

/// Parse an RR table: one interval per line, optionally followed by its
/// onset time in a second column separated by whitespace or a comma.
///
/// Either every row has two columns or none does.
pub fn parse_rr_table(text: &str) -> Result<(Vec<f64>, Option<Vec<f64>>)> {
    let mut rri = Vec::new();
    let mut trr = Vec::new();
    let mut columns = None;
    for (lineno, line) in data_lines(text) {
        let fields: Vec<&str> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty())
            .collect();
        let expected = *columns.get_or_insert(fields.len());
        if fields.len() != expected || !(1..=2).contains(&fields.len()) {
            anyhow::bail!(
                "line {lineno} has {} columns, expected {}",
                fields.len(),
                expected.clamp(1, 2)
            );
        }
        for (col, field) in fields.iter().enumerate() {
            let val: f64 = field
                .parse()
                .with_context(|| format!("line {lineno} column {} is not a number: {field}", col + 1))?;
            if col == 0 {
                rri.push(val);
            } else {
                trr.push(val);
            }
        }
    }
    if rri.is_empty() {
        anyhow::bail!("no RR intervals found");
    }
    Ok((rri, (columns == Some(2)).then_some(trr)))
}

pub fn read_rr_table(path: &Path) -> Result<(Vec<f64>, Option<Vec<f64>>)> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_rr_table(&text).with_context(|| format!("invalid RR table {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn skips_comments_and_blanks() {
        let values = parse_f64_series("# rr in seconds\n0.81\n\n  0.79  \n").unwrap();
        assert_eq!(values, vec![0.81, 0.79]);
    }

    #[test]
    fn reports_offending_line() {
        let err = parse_f64_series("0.8\nabc\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
        assert!(parse_f64_series("# nothing\n").is_err());
    }

    #[test]
    fn parses_one_and_two_column_tables() {
        let (rri, trr) = parse_rr_table("0.8\n0.9\n").unwrap();
        assert_eq!(rri, vec![0.8, 0.9]);
        assert!(trr.is_none());

        let (rri, trr) = parse_rr_table("0.8, 0.0\n0.9\t0.8\n").unwrap();
        assert_eq!(rri, vec![0.8, 0.9]);
        assert_eq!(trr, Some(vec![0.0, 0.8]));
    }

    #[test]
    fn rejects_ragged_tables() {
        assert!(parse_rr_table("0.8 0.0\n0.9\n").is_err());
        assert!(parse_rr_table("0.8 0.0 1\n").is_err());
    }

    #[test]
    fn reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0.8\n0.82\n0.78").unwrap();
        assert_eq!(read_f64_series(file.path()).unwrap().len(), 3);
        let (rri, trr) = read_rr_table(file.path()).unwrap();
        assert_eq!(rri.len(), 3);
        assert!(trr.is_none());
    }
}
