//! Value Copy Module
//!
//! Defines the deep-copy capability the cache requires of keys and values.
//! Entries are copied on the way in and on the way out, so the caller and the
//! cache never share an allocation.

use std::fmt;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::{CacheError, Result};

// == Deep Copy ==
/// Produces an independent copy of a value.
///
/// Unlike `Clone`, copying may fail. A failed copy is reported as
/// [`CacheError::CopyFailure`] and never reaches the cache structure.
pub trait DeepCopy: Sized {
    fn deep_copy(&self) -> Result<Self>;
}

macro_rules! impl_deep_copy_via_clone {
    ($($t:ty),* $(,)?) => {
        $(
            impl DeepCopy for $t {
                #[inline]
                fn deep_copy(&self) -> Result<Self> {
                    Ok(self.clone())
                }
            }
        )*
    };
}

impl_deep_copy_via_clone!(
    bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64,
    String,
);

impl<T: DeepCopy> DeepCopy for Vec<T> {
    fn deep_copy(&self) -> Result<Self> {
        self.iter().map(DeepCopy::deep_copy).collect()
    }
}

impl<T: DeepCopy> DeepCopy for Option<T> {
    fn deep_copy(&self) -> Result<Self> {
        self.as_ref().map(DeepCopy::deep_copy).transpose()
    }
}

impl<T: DeepCopy> DeepCopy for Box<T> {
    fn deep_copy(&self) -> Result<Self> {
        Ok(Box::new((**self).deep_copy()?))
    }
}

impl<A: DeepCopy, B: DeepCopy> DeepCopy for (A, B) {
    fn deep_copy(&self) -> Result<Self> {
        Ok((self.0.deep_copy()?, self.1.deep_copy()?))
    }
}

// == Serialized ==
/// Copies the wrapped value by serializing it to JSON and reading it back.
///
/// Any serde type can be cached this way without implementing [`DeepCopy`].
/// Values that do not survive the round trip (non-finite floats, maps with
/// non-string keys) fail with [`CacheError::CopyFailure`].
#[derive(Debug, Clone, PartialEq, Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Serialized<T>(pub T);

impl<T> Serialized<T> {
    /// Returns the wrapped value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> AsRef<T> for Serialized<T> {
    fn as_ref(&self) -> &T {
        &self.0
    }
}

impl<T: Serialize + DeserializeOwned> DeepCopy for Serialized<T> {
    fn deep_copy(&self) -> Result<Self> {
        let bytes = serde_json::to_vec(&self.0)
            .map_err(|e| CacheError::CopyFailure(format!("serialize: {}", e)))?;
        let value = serde_json::from_slice(&bytes)
            .map_err(|e| CacheError::CopyFailure(format!("deserialize: {}", e)))?;
        Ok(Serialized(value))
    }
}

impl<T: fmt::Display> fmt::Display for Serialized<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}
