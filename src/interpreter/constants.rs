// Constants for the stepping interpreter

/// Default operation budget for a single step
/// Every executed statement and loop iteration costs one operation
pub const DEFAULT_MAX_OPERATIONS: u64 = 1_000_000;

/// Upper bound on sequence lengths produced by `*` repetition and `range`
/// materialisation, so a single expression cannot exhaust memory
pub const MAX_SEQUENCE_LENGTH: usize = 10_000_000;

/// Deepest nesting of brackets, unary operators and blocks the parser
/// accepts. The parser recurses once per level; the bound keeps the deepest
/// accepted input well inside a 2 MiB thread stack in debug builds.
pub const MAX_NESTING_DEPTH: usize = 50;

/// Names resolved by the builtin table when no variable shadows them
pub const BUILTIN_NAMES: &[&str] = &[
    "print", "range", "len", "str", "int", "float", "bool", "abs", "min", "max", "sum", "repr",
    "list", "tuple", "sorted", "round", "enumerate", "zip", "type",
];
