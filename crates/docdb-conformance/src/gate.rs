/// Run/skip precondition of one case.
///
/// A case runs only when every `requires` entry holds and no `skip_if` entry
/// does. Both lists are plain booleans computed from the field roles and the
/// feature matrix when the suite is built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Gate {
    pub requires: Vec<bool>,
    pub skip_if: Vec<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Run,
    Skip,
}

impl Gate {
    pub fn always() -> Self {
        Self::default()
    }

    pub fn requires(requires: impl IntoIterator<Item = bool>) -> Self {
        Self {
            requires: requires.into_iter().collect(),
            skip_if: Vec::new(),
        }
    }

    pub fn skip_if(mut self, skip_if: impl IntoIterator<Item = bool>) -> Self {
        self.skip_if.extend(skip_if);
        self
    }

    pub fn decide(&self) -> Decision {
        if self.requires.iter().all(|r| *r) && !self.skip_if.iter().any(|s| *s) {
            Decision::Run
        } else {
            Decision::Skip
        }
    }
}
