//! Example programs compiled into the binary

const PROGRAMS: &[(&str, &str)] = &[
    ("hello.lox", include_str!("../../lox_files/hello.lox")),
    ("linked_list.lox", include_str!("../../lox_files/linked_list.lox")),
    ("two_statements.lox", include_str!("../../lox_files/two_statements.lox")),
];

/// Keys of all bundled programs, in catalog order
pub fn keys() -> impl Iterator<Item = &'static str> {
    PROGRAMS.iter().map(|(key, _)| *key)
}

pub fn lookup(key: &str) -> Option<&'static str> {
    PROGRAMS
        .iter()
        .find(|(name, _)| *name == key)
        .map(|(_, text)| *text)
}
