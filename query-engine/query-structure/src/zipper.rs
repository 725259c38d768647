use crate::Schema;

// Invariant: SchemaData must not contain any Zipper, this would be a reference counting
// cycle (memory leak).
#[derive(Debug, Clone)]
pub struct Zipper<I> {
    pub id: I,
    pub schema: Schema,
}

impl<I: PartialEq> PartialEq for Zipper<I> {
    fn eq(&self, other: &Self) -> bool {
        self.id.eq(&other.id)
    }
}

impl<I: Eq> Eq for Zipper<I> {}

impl<I: std::hash::Hash> std::hash::Hash for Zipper<I> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state)
    }
}
