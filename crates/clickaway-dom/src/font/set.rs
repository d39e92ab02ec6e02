#![forbid(unsafe_code)]

//! The document font registry (`document.fonts`).

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::font::face::{FontFace, FontFaceLoadStatus};

/// Ordered set of font faces registered with a document.
#[derive(Clone, Default)]
pub struct FontFaceSet {
    faces: Rc<RefCell<Vec<FontFace>>>,
}

impl FontFaceSet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `face`. Returns `false` if it is already registered.
    pub fn add(&self, face: &FontFace) -> bool {
        let mut faces = self.faces.borrow_mut();
        if faces.iter().any(|f| f.ptr_eq(face)) {
            return false;
        }
        faces.push(face.clone());
        true
    }

    pub fn delete(&self, face: &FontFace) -> bool {
        let mut faces = self.faces.borrow_mut();
        match faces.iter().position(|f| f.ptr_eq(face)) {
            Some(index) => {
                faces.remove(index);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn has(&self, face: &FontFace) -> bool {
        self.faces.borrow().iter().any(|f| f.ptr_eq(face))
    }

    pub fn clear(&self) {
        self.faces.borrow_mut().clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.faces.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.faces.borrow().is_empty()
    }

    /// Registered faces in registration order.
    #[must_use]
    pub fn faces(&self) -> Vec<FontFace> {
        self.faces.borrow().clone()
    }

    /// Whether a loaded face of `family` (ASCII case-insensitive) is
    /// registered.
    #[must_use]
    pub fn check(&self, family: &str) -> bool {
        self.faces.borrow().iter().any(|f| {
            f.status() == FontFaceLoadStatus::Loaded && f.family().eq_ignore_ascii_case(family)
        })
    }

    /// Whether any registered face is still loading.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.faces
            .borrow()
            .iter()
            .any(|f| f.status() == FontFaceLoadStatus::Loading)
    }
}

impl fmt::Debug for FontFaceSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.faces.borrow().iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::{FontFaceDescriptors, FontSource};

    fn face(family: &str, bytes: &[u8]) -> FontFace {
        FontFace::new(
            family,
            FontSource::binary(bytes.to_vec()),
            FontFaceDescriptors::default(),
        )
    }

    #[test]
    fn add_is_idempotent_per_face() {
        let set = FontFaceSet::new();
        let inter = face("Inter", b"wOF2");
        assert!(set.add(&inter));
        assert!(!set.add(&inter.clone()));
        assert!(set.add(&face("Inter", b"wOF2")));
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn delete_and_clear() {
        let set = FontFaceSet::new();
        let inter = face("Inter", b"wOF2");
        set.add(&inter);
        assert!(set.has(&inter));
        assert!(set.delete(&inter));
        assert!(!set.delete(&inter));
        set.add(&inter);
        set.clear();
        assert!(set.is_empty());
    }

    #[test]
    fn check_requires_a_loaded_face() {
        let set = FontFaceSet::new();
        set.add(&face("Broken", b"xxxx"));
        set.add(&face("Inter", b"OTTO"));
        assert!(set.check("inter"));
        assert!(!set.check("Broken"));
        assert!(!set.check("Roboto"));
        assert!(!set.is_loading());
    }
}
