/// Where a Running traversal resumes.
///
/// One stack per entity, shared by the whole tree during a tick and mutated only by
/// composites. Each Running composite on the active path leaves the index of the child it
/// will try next; an empty stack means every composite starts from its first child.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResumptionStack {
    frames: Vec<usize>,
}

impl ResumptionStack {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, index: usize) {
        self.frames.push(index);
    }

    pub fn pop(&mut self) -> Option<usize> {
        self.frames.pop()
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames from the bottom of the stack to the top (the next one popped is last).
    pub fn as_slice(&self) -> &[usize] {
        &self.frames
    }
}

impl From<Vec<usize>> for ResumptionStack {
    fn from(frames: Vec<usize>) -> Self {
        Self { frames }
    }
}
