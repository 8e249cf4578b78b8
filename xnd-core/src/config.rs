/// Tunables for the layout planner and marshaller. `Default` gives the
/// conservative values this workspace ships with (MAX_DIM = 128).
#[derive(Clone, Debug)]
pub struct LayoutConfig {
    /// Alignment used for nodes that don't declare their own `align=`.
    pub default_align: usize,
    /// Maximum nesting depth accepted by type inference.
    pub max_dim: usize,
    /// Whether fixed-strings shorter than their declared length get
    /// zero-padded on write.
    pub zero_pad_fixed_strings: bool,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        LayoutConfig {
            default_align: 8,
            max_dim: 128,
            zero_pad_fixed_strings: true,
        }
    }
}
