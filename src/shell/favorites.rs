use std::collections::{HashMap, HashSet};

/// Local favorite titles with per-title versions for optimistic toggles.
///
/// Every toggle bumps the title's version. A failed toggle only rolls back
/// when no newer toggle of the same title has happened since, and then it
/// restores the membership captured before the toggle instead of inverting
/// whatever the set holds now.
#[derive(Debug, Default, Clone)]
pub struct FavoriteSet {
    titles: HashSet<String>,
    versions: HashMap<String, u64>,
}

/// An applied but unconfirmed toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingToggle {
    pub title: String,
    pub was_favorite: bool,
    version: u64,
}

impl PendingToggle {
    /// Whether the toggle turned the title into a favorite.
    pub fn adds(&self) -> bool {
        !self.was_favorite
    }
}

impl FavoriteSet {
    pub fn from_titles<I>(titles: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            titles: titles.into_iter().collect(),
            versions: HashMap::new(),
        }
    }

    pub fn contains(&self, title: &str) -> bool {
        self.titles.contains(title)
    }

    pub fn titles(&self) -> &HashSet<String> {
        &self.titles
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    /// Flip membership immediately.
    pub fn begin_toggle(&mut self, title: &str) -> PendingToggle {
        let was_favorite = self.titles.contains(title);
        if was_favorite {
            self.titles.remove(title);
        } else {
            self.titles.insert(title.to_string());
        }

        let version = self.versions.entry(title.to_string()).or_insert(0);
        *version += 1;

        PendingToggle {
            title: title.to_string(),
            was_favorite,
            version: *version,
        }
    }

    /// Resolve a toggle. Returns `true` when the set was rolled back.
    pub fn settle(&mut self, pending: &PendingToggle, confirmed: bool) -> bool {
        if confirmed {
            return false;
        }
        if self.versions.get(&pending.title) != Some(&pending.version) {
            // A newer toggle owns this title now.
            return false;
        }
        if pending.was_favorite {
            self.titles.insert(pending.title.clone());
        } else {
            self.titles.remove(&pending.title);
        }
        true
    }
}
