//! Balanced argument-list splitting.

/// Split a comma-joined argument list on top-level commas.
///
/// Commas nested inside parentheses or brackets (function-pointer
/// parameters, constructor-call defaults, array sizes) do not split. Pieces
/// are returned untrimmed, so joining them with `,` gives back the input.
///
/// ```
/// use symbind_types::split_args;
///
/// assert_eq!(split_args("int foo,const char* bar"), vec!["int foo", "const char* bar"]);
/// assert!(split_args("").is_empty());
/// ```
pub fn split_args(args: &str) -> Vec<&str> {
    if args.is_empty() {
        return Vec::new();
    }

    let mut pieces = Vec::new();
    let mut depth: i32 = 0;
    let mut start = 0;

    for (i, ch) in args.char_indices() {
        match ch {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            ',' if depth == 0 => {
                pieces.push(&args[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    pieces.push(&args[start..]);
    pieces
}

/// Find the byte index of the first `ch` outside any parentheses.
pub(crate) fn find_top_level(s: &str, ch: char) -> Option<usize> {
    let mut depth: i32 = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' | '[' => depth += 1,
            ')' | ']' => depth -= 1,
            _ if c == ch && depth == 0 => return Some(i),
            _ => {}
        }
    }
    None
}

/// Given `s[open]` is an opening delimiter, find its matching close.
pub(crate) fn matching_close(s: &str, open: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    let (open_ch, close_ch) = match bytes.get(open)? {
        b'(' => (b'(', b')'),
        b'[' => (b'[', b']'),
        b'<' => (b'<', b'>'),
        _ => return None,
    };
    let mut depth = 0usize;
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        if b == open_ch {
            depth += 1;
        } else if b == close_ch {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}

/// Given `s[close]` is a closing delimiter, find its matching open.
pub fn matching_open(s: &str, close: usize) -> Option<usize> {
    let bytes = s.as_bytes();
    let (open_ch, close_ch) = match bytes.get(close)? {
        b')' => (b'(', b')'),
        b']' => (b'[', b']'),
        _ => return None,
    };
    let mut depth = 0usize;
    for i in (0..=close).rev() {
        if bytes[i] == close_ch {
            depth += 1;
        } else if bytes[i] == open_ch {
            depth -= 1;
            if depth == 0 {
                return Some(i);
            }
        }
    }
    None
}
