use std::fmt::{Debug, Display};
use std::marker::PhantomData;

use crossbeam::atomic::AtomicCell;

static ID_COUNTER: AtomicCell<u64> = AtomicCell::new(1);

/// Something the session engine hands out ids for.
pub trait Identified {
    /// Printed in front of the number, e.g. `item#12`.
    const LABEL: &'static str;
}

/// A process-unique identifier, tagged with the kind of thing it identifies.
///
/// Ids of different kinds never compare, and every id is handed out once, so a
/// stale id held by a timer or a button can be checked against the current one.
pub struct Id<T> {
    value: u64,
    kind: PhantomData<T>,
}

impl<T> Id<T> {
    pub fn new() -> Self {
        Self {
            value: ID_COUNTER.fetch_add(1),
            kind: PhantomData,
        }
    }
}

impl<T> Default for Id<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Identified> Display for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", T::LABEL, self.value)
    }
}

impl<T: Identified> Debug for Id<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Id<T> {}

#[cfg(test)]
mod test {
    use super::{Id, Identified};

    struct Thing;

    impl Identified for Thing {
        const LABEL: &'static str = "thing";
    }

    #[test]
    fn ids_are_unique() {
        let a = Id::<Thing>::new();
        let b = Id::<Thing>::default();

        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn ids_print_their_kind() {
        let id = Id::<Thing>::new();

        assert!(id.to_string().starts_with("thing#"));
        assert_eq!(format!("{:?}", id), id.to_string());
    }
}
