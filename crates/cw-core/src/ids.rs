//! Typed identifiers for inventory assets.
//!
//! An asset is addressed by a three-character [`Category`] plus a
//! four-character, zero-padded [`CartId`]. Both are validated on
//! construction so the rest of the workspace can build paths and envelopes
//! from them without re-checking.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{Error, Result};

/// Length of a category code.
pub const CATEGORY_LEN: usize = 3;

/// Length of a cart id after zero padding.
pub const CART_ID_LEN: usize = 4;

/// Three-character category code (e.g. `MUS`, `COM`), stored upper-case.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Category(String);

impl Category {
    /// Validate and normalize a category code.
    pub fn new(code: &str) -> Result<Self> {
        let code = code.trim();
        if code.len() != CATEGORY_LEN || !code.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(Error::Validation(format!(
                "category must be {CATEGORY_LEN} alphanumeric characters, got {code:?}"
            )));
        }
        Ok(Self(code.to_ascii_uppercase()))
    }

    /// The normalized code.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Category {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(&s)
    }
}

impl From<Category> for String {
    fn from(c: Category) -> Self {
        c.0
    }
}

/// Cart id within a category, zero-padded to four characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CartId(String);

impl CartId {
    /// Validate a cart id and left-pad it with `0` to four characters.
    pub fn new(id: &str) -> Result<Self> {
        let id = id.trim();
        if id.is_empty()
            || id.len() > CART_ID_LEN
            || !id.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(Error::Validation(format!(
                "cart id must be 1-{CART_ID_LEN} alphanumeric characters, got {id:?}"
            )));
        }
        Ok(Self(format!("{:0>width$}", id.to_ascii_uppercase(), width = CART_ID_LEN)))
    }

    /// The padded id.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CartId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CartId {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::new(&s)
    }
}

impl From<CartId> for String {
    fn from(c: CartId) -> Self {
        c.0
    }
}

/// Full identity of one inventory asset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId {
    pub category: Category,
    pub cart_id: CartId,
}

impl AssetId {
    pub fn new(category: Category, cart_id: CartId) -> Self {
        Self { category, cart_id }
    }

    /// Location of the asset's audio on the shared audio root:
    /// `<root>/<category>/SP<cartId>.wav`.
    pub fn source_path(&self, audio_root: &Path) -> PathBuf {
        audio_root
            .join(self.category.as_str())
            .join(format!("SP{}.wav", self.cart_id))
    }

    /// File name the downstream server routes back to this asset when it
    /// appears in the import directory: `<category><cartId>.wav`.
    pub fn import_file_name(&self) -> String {
        format!("{}{}.wav", self.category, self.cart_id)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.category, self.cart_id)
    }
}

impl FromStr for AssetId {
    type Err = Error;

    /// Accepts `CAT/CART`, `CAT:CART` or `CATCART`.
    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let (category, cart) = match s.split_once(['/', ':']) {
            Some(parts) => parts,
            None if s.len() > CATEGORY_LEN && s.is_char_boundary(CATEGORY_LEN) => {
                s.split_at(CATEGORY_LEN)
            }
            None => {
                return Err(Error::Validation(format!(
                    "asset id must look like CAT/CART, got {s:?}"
                )))
            }
        };
        Ok(Self::new(Category::new(category)?, CartId::new(cart)?))
    }
}
