use crate::align::EditOp;

/// Render an alignment as four centred rows: source, bars, target and edit codes.
///
/// Deletions show `*` on the target row, insertions show `*` on the source row, and equal
/// positions leave the code row blank. Diagnostic output only.
pub fn render_alignment<S, T>(source: &[S], target: &[T], ops: &[EditOp]) -> String
where
    S: AsRef<str>,
    T: AsRef<str>,
{
    let mut rows: [Vec<String>; 4] = Default::default();
    let (mut i, mut j) = (0usize, 0usize);

    for op in ops {
        let s = match op {
            EditOp::Insert => "*",
            _ => source.get(i).map(AsRef::as_ref).unwrap_or("*"),
        };
        let t = match op {
            EditOp::Delete => "*",
            _ => target.get(j).map(AsRef::as_ref).unwrap_or("*"),
        };
        let code = match op {
            EditOp::Equal => " ".to_string(),
            other => other.as_char().to_string(),
        };

        let width = [s, t, code.as_str()]
            .iter()
            .map(|x| x.chars().count())
            .max()
            .unwrap_or(1);
        for (row, token) in rows.iter_mut().zip([s, "|", t, code.as_str()]) {
            row.push(center(token, width));
        }

        if *op != EditOp::Delete {
            j += 1;
        }
        if *op != EditOp::Insert {
            i += 1;
        }
    }

    rows.iter()
        .map(|row| row.join(" "))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Pad `token` to `width` columns. With odd padding the extra space goes left when `width` is
/// odd and right when it is even, so columns line up with the Python `str.center` layout.
fn center(token: &str, width: usize) -> String {
    let margin = width.saturating_sub(token.chars().count());
    let left = margin / 2 + (margin & width & 1);
    format!(
        "{}{token}{}",
        " ".repeat(left),
        " ".repeat(margin - left)
    )
}
