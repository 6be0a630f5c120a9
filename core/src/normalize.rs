/// Strip the leading utterance id from a transcript line and collapse whitespace.
///
/// The line is trimmed first. The first token and the single whitespace character after it are
/// dropped; a line with no whitespace at all is kept intact. Remaining whitespace runs collapse to
/// one space.
pub fn normalize_line(line: &str) -> String {
    let line = line.trim();
    let body = match line.find(char::is_whitespace) {
        Some(idx) => {
            let sep_len = line[idx..].chars().next().map(char::len_utf8).unwrap_or(0);
            &line[idx + sep_len..]
        }
        None => line,
    };

    let mut out = String::with_capacity(body.len());
    let mut last_space = true;
    for c in body.chars() {
        if c.is_whitespace() {
            if !last_space {
                out.push(' ');
                last_space = true;
            }
        } else {
            out.push(c);
            last_space = false;
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

/// First whitespace-delimited token of a line, if any.
pub fn utterance_id(line: &str) -> Option<&str> {
    line.split_whitespace().next()
}

pub fn tokenize_words(s: &str) -> Vec<&str> {
    if s.is_empty() {
        return Vec::new();
    }
    s.split_whitespace().collect()
}
