use crate::block::{AudioBlockMut, AudioBlockRef, Sample};

/// Per-cycle processing entry point called by the host streaming graph.
///
/// The graph hands each node its input blocks (read-only, possibly absent)
/// and the output slots it allocated for this cycle. Whatever a node leaves
/// in `outputs` is transmitted downstream; everything else is released when
/// the graph drops it at the end of the cycle.
pub trait AudioNode {
    /// Sample type flowing through this node.
    type Sample: Sample;

    /// Number of input channels this node accepts.
    const NUM_INPUTS: usize;

    /// Number of output channels this node produces.
    const NUM_OUTPUTS: usize;

    /// Process one block period.
    ///
    /// A `None` input is a silent channel. A `None` output means the graph
    /// could not allocate a block for that channel and the node must skip it.
    fn update(
        &mut self,
        inputs: &[Option<AudioBlockRef<Self::Sample>>],
        outputs: &mut [Option<AudioBlockMut<Self::Sample>>],
    );
}
