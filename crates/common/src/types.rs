//! Static and runtime type descriptors.
//!
//! A type is a base type plus an array nesting level. Nesting `-1` is a
//! scalar, `0` a flat array of scalars, `1` an array of arrays, and so on.

use std::fmt;

/// The scalar type a value ultimately bottoms out to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseType {
    /// 32-bit signed integer.
    Int,
    /// Boolean.
    Bool,
    /// Reference-counted string.
    String,
    /// Not yet known (element type of an empty array literal).
    Unknown,
}

impl BaseType {
    /// Source-level keyword for this base type.
    pub fn name(&self) -> &'static str {
        match self {
            BaseType::Int => "int",
            BaseType::Bool => "bool",
            BaseType::String => "string",
            BaseType::Unknown => "unknown",
        }
    }
}

/// Nesting level of a scalar.
pub const SCALAR: i16 = -1;

/// A base type together with its array nesting level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarType {
    pub base: BaseType,
    pub nesting: i16,
}

impl VarType {
    pub const INT: VarType = VarType::scalar(BaseType::Int);
    pub const BOOL: VarType = VarType::scalar(BaseType::Bool);
    pub const STRING: VarType = VarType::scalar(BaseType::String);
    pub const UNKNOWN: VarType = VarType::scalar(BaseType::Unknown);

    pub const fn scalar(base: BaseType) -> Self {
        Self {
            base,
            nesting: SCALAR,
        }
    }

    pub const fn new(base: BaseType, nesting: i16) -> Self {
        Self { base, nesting }
    }

    pub fn is_array(&self) -> bool {
        self.nesting >= 0
    }

    pub fn is_scalar(&self) -> bool {
        self.nesting == SCALAR
    }

    pub fn is_known(&self) -> bool {
        self.base != BaseType::Unknown
    }

    /// The type of an array whose elements have this type.
    pub fn array_of(&self) -> Self {
        Self {
            base: self.base,
            nesting: self.nesting.saturating_add(1),
        }
    }

    /// The element type of this array type, or `None` for scalars.
    pub fn element(&self) -> Option<Self> {
        if self.is_array() {
            Some(Self {
                base: self.base,
                nesting: self.nesting - 1,
            })
        } else {
            None
        }
    }

    /// Whether a value of type `self` may be stored where `target` is expected.
    ///
    /// Identical types are always compatible. An array whose base is still
    /// unknown (built from empty literals) fits any array type that is at
    /// least as deeply nested.
    pub fn fits(&self, target: &VarType) -> bool {
        if self == target {
            return true;
        }
        !self.is_known() && self.is_array() && target.is_array() && self.nesting <= target.nesting
    }

    /// The common type of two array-literal elements, if there is one.
    pub fn unify(&self, other: &VarType) -> Option<VarType> {
        if self.fits(other) {
            Some(*other)
        } else if other.fits(self) {
            Some(*self)
        } else {
            None
        }
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base.name())?;
        for _ in 0..=self.nesting {
            f.write_str("[]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_constants() {
        assert!(VarType::INT.is_scalar());
        assert!(!VarType::INT.is_array());
        assert_eq!(VarType::INT.element(), None);
    }

    #[test]
    fn array_of_and_element_are_inverse() {
        let matrix = VarType::INT.array_of().array_of();
        assert_eq!(matrix.nesting, 1);
        assert_eq!(matrix.element(), Some(VarType::new(BaseType::Int, 0)));
        assert_eq!(matrix.element().and_then(|t| t.element()), Some(VarType::INT));
    }

    #[test]
    fn display_includes_brackets() {
        assert_eq!(VarType::STRING.to_string(), "string");
        assert_eq!(VarType::new(BaseType::Int, 0).to_string(), "int[]");
        assert_eq!(VarType::new(BaseType::Bool, 2).to_string(), "bool[][][]");
    }

    #[test]
    fn empty_array_fits_any_deeper_array() {
        let empty = VarType::new(BaseType::Unknown, 0);
        assert!(empty.fits(&VarType::new(BaseType::Int, 0)));
        assert!(empty.fits(&VarType::new(BaseType::String, 3)));
        assert!(!empty.fits(&VarType::INT));

        let nested_empty = VarType::new(BaseType::Unknown, 1);
        assert!(nested_empty.fits(&VarType::new(BaseType::Int, 1)));
        assert!(!nested_empty.fits(&VarType::new(BaseType::Int, 0)));
    }

    #[test]
    fn unify_prefers_known_side() {
        let empty = VarType::new(BaseType::Unknown, 0);
        let ints = VarType::new(BaseType::Int, 0);
        assert_eq!(empty.unify(&ints), Some(ints));
        assert_eq!(ints.unify(&empty), Some(ints));
        assert_eq!(ints.unify(&VarType::new(BaseType::Bool, 0)), None);
    }
}
