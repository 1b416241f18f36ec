use std::collections::HashMap;

/// Global label name → label-id, built incrementally as translation
/// units are merged (C3).
pub type LabelMap = HashMap<String, u64>;

/// Label-id → the index of the first instruction following that label's
/// definition, filled in by the resolver's first pass (C4).
pub type IndexToPosition = HashMap<u64, u32>;
