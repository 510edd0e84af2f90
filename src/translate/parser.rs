use std::ffi::{OsStr, OsString};
use std::os::unix::ffi::{OsStrExt, OsStringExt};

const SEP: u8 = b'/';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPath<'a> {
    pub absolute: bool,
    pub components: Vec<&'a OsStr>,
}

/// Split a client path into its components, dropping empty and `.` parts.
pub fn parse_path(path: &OsStr) -> ParsedPath<'_> {
    let bytes = path.as_bytes();
    let absolute = bytes.first() == Some(&SEP);
    let components = bytes
        .split(|b| *b == SEP)
        .filter(|part| !part.is_empty() && *part != b".")
        .map(OsStr::from_bytes)
        .collect();
    ParsedPath {
        absolute,
        components,
    }
}

/// Rebuild `path` from its components: no empty, `.` or trailing parts.
pub fn normalize(path: &OsStr) -> OsString {
    let parsed = parse_path(path);
    let mut out = OsString::from(if parsed.absolute { "/" } else { "" });
    for component in parsed.components {
        out = join(&out, component);
    }
    out
}

/// Join `name` onto `dir` with exactly one separator between them.
pub fn join(dir: &OsStr, name: &OsStr) -> OsString {
    let dir = dir.as_bytes();
    let mut out = Vec::with_capacity(dir.len() + name.len() + 1);
    out.extend_from_slice(dir);
    if !dir.is_empty() && dir.last() != Some(&SEP) {
        out.push(SEP);
    }
    out.extend_from_slice(name.as_bytes());
    OsString::from_vec(out)
}

/// Final component of `path` (everything after the last separator).
pub fn basename(path: &OsStr) -> &OsStr {
    let bytes = path.as_bytes();
    match bytes.iter().rposition(|b| *b == SEP) {
        Some(idx) => OsStr::from_bytes(&bytes[idx + 1..]),
        None => path,
    }
}

/// Split `path` into `(stem, extension)`.
///
/// The extension starts at the last `.` of the final component; leading dots of
/// that component never start an extension, so `.profile` has none.
pub fn split_extension(path: &OsStr) -> (&OsStr, &OsStr) {
    let bytes = path.as_bytes();
    let name_start = bytes
        .iter()
        .rposition(|b| *b == SEP)
        .map(|idx| idx + 1)
        .unwrap_or(0);
    let name = &bytes[name_start..];
    let leading_dots = name.iter().take_while(|b| **b == b'.').count();
    match name[leading_dots..].iter().rposition(|b| *b == b'.') {
        Some(dot) => {
            let split = name_start + leading_dots + dot;
            (
                OsStr::from_bytes(&bytes[..split]),
                OsStr::from_bytes(&bytes[split..]),
            )
        }
        None => (path, OsStr::new("")),
    }
}
