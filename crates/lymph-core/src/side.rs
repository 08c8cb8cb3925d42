//! Neck sides and per-side pairs.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Ipsi,
    Contra,
}

impl Side {
    /// Both sides, ipsilateral first.
    pub const BOTH: [Side; 2] = [Side::Ipsi, Side::Contra];

    pub fn other(self) -> Side {
        match self {
            Side::Ipsi => Side::Contra,
            Side::Contra => Side::Ipsi,
        }
    }

    /// Label used in patient table columns.
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Ipsi => "ipsi",
            Side::Contra => "contra",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One value per side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BySide<T> {
    pub ipsi: T,
    pub contra: T,
}

impl<T> BySide<T> {
    pub fn new(ipsi: T, contra: T) -> Self {
        Self { ipsi, contra }
    }

    pub fn from_fn(mut f: impl FnMut(Side) -> T) -> Self {
        Self {
            ipsi: f(Side::Ipsi),
            contra: f(Side::Contra),
        }
    }

    /// Like [`BySide::from_fn`], stopping at the first error.
    pub fn try_from_fn<E>(mut f: impl FnMut(Side) -> Result<T, E>) -> Result<Self, E> {
        Ok(Self {
            ipsi: f(Side::Ipsi)?,
            contra: f(Side::Contra)?,
        })
    }

    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> BySide<U> {
        BySide {
            ipsi: f(self.ipsi),
            contra: f(self.contra),
        }
    }

    pub fn as_ref(&self) -> BySide<&T> {
        BySide {
            ipsi: &self.ipsi,
            contra: &self.contra,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Side, &T)> {
        [(Side::Ipsi, &self.ipsi), (Side::Contra, &self.contra)].into_iter()
    }
}

impl<T> Index<Side> for BySide<T> {
    type Output = T;

    fn index(&self, side: Side) -> &T {
        match side {
            Side::Ipsi => &self.ipsi,
            Side::Contra => &self.contra,
        }
    }
}

impl<T> IndexMut<Side> for BySide<T> {
    fn index_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Ipsi => &mut self.ipsi,
            Side::Contra => &mut self.contra,
        }
    }
}
