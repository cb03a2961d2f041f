use crate::types::Vertex;

/// Trait for polygon simplification algorithms
pub trait PolygonSimplifier: Send + Sync {
    /// Reduce the vertex count of a closed ring.
    ///
    /// The input ring is open (last vertex connects back to the first) and
    /// the returned ring must be as well, with at least three vertices.
    fn simplify(&self, vertices: &[Vertex]) -> Vec<Vertex>;

    /// Short name used in logs
    fn name(&self) -> &'static str;
}

/// Trait for caller-supplied cancellation, polled at stage boundaries
pub trait CancellationSignal: Send + Sync {
    fn is_cancelled(&self) -> bool;
}
