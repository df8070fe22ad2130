use serde::{Deserialize, Serialize};

pub const DEFAULT_COUNT: usize = 10;

/// Pagination window over a `find` result.
///
/// Both bounds are optional on the wire; the effective window is read through
/// [`Cursor::offset`] and [`Cursor::limit`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor {
    #[serde(default)]
    pub start_offset: Option<usize>,
    #[serde(default)]
    pub count: Option<usize>,
}

impl Cursor {
    pub fn new(start_offset: usize, count: usize) -> Self {
        Self {
            start_offset: Some(start_offset),
            count: Some(count),
        }
    }

    pub fn offset(start_offset: usize) -> Self {
        Self {
            start_offset: Some(start_offset),
            count: None,
        }
    }

    pub fn count(count: usize) -> Self {
        Self {
            start_offset: None,
            count: Some(count),
        }
    }

    pub fn start(&self) -> usize {
        self.start_offset.unwrap_or(0)
    }

    pub fn limit(&self) -> usize {
        self.count.unwrap_or(DEFAULT_COUNT)
    }

    /// Apply this window to an already ordered sequence.
    pub fn window<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.start())
            .take(self.limit())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = Cursor::default();
        assert_eq!(c.start(), 0);
        assert_eq!(c.limit(), 10);
    }

    #[test]
    fn window_skips_and_takes() {
        let c = Cursor::new(3, 2);
        assert_eq!(c.window(0..20), vec![3, 4]);
    }

    #[test]
    fn window_past_end_is_empty() {
        let c = Cursor::offset(30);
        assert!(c.window(0..20).is_empty());
    }

    #[test]
    fn count_only_starts_at_zero() {
        let c = Cursor::count(11);
        assert_eq!(c.window(0..20).len(), 11);
        assert_eq!(c.window(0..20)[0], 0);
    }
}
