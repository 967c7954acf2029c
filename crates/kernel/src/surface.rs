//! In-memory presentation surface: the mount element, the per-world container
//! and the elements collaborators contribute (renderer output, stats panel).

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

/// Shared handle to an [`Element`].
pub type ElementRef = Rc<RefCell<Element>>;

/// Class name given to the container each world creates inside its mount element.
pub const CONTAINER_CLASS: &str = "stagecraft";

/// A presentation-surface node with inline style, text and children.
#[derive(Debug, Clone, Default)]
pub struct Element {
    tag: String,
    class_name: Option<String>,
    style: BTreeMap<String, String>,
    text: String,
    children: Vec<ElementRef>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    /// Create a new element already wrapped in a shared handle.
    pub fn shared(tag: impl Into<String>) -> ElementRef {
        Rc::new(RefCell::new(Self::new(tag)))
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn class_name(&self) -> Option<&str> {
        self.class_name.as_deref()
    }

    pub fn set_class_name(&mut self, class: impl Into<String>) {
        self.class_name = Some(class.into());
    }

    pub fn set_style(&mut self, property: &str, value: impl Into<String>) {
        self.style.insert(property.to_string(), value.into());
    }

    pub fn style(&self, property: &str) -> Option<&str> {
        self.style.get(property).map(String::as_str)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn append_child(&mut self, child: ElementRef) {
        self.children.push(child);
    }

    pub fn children(&self) -> &[ElementRef] {
        &self.children
    }
}

/// Lay out the mount element for absolutely positioned overlays and create the
/// container dedicated to one world instance.
pub(crate) fn prepare_mount(mount: &ElementRef) -> ElementRef {
    let container = Element::shared("div");
    container.borrow_mut().set_class_name(CONTAINER_CLASS);

    let mut m = mount.borrow_mut();
    m.set_style("margin", "0");
    m.set_style("padding", "0");
    m.set_style("position", "relative");
    m.set_style("overflow", "hidden");
    m.append_child(Rc::clone(&container));

    container
}
