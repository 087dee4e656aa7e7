//! Intrusive device registry.
//!
//! Each device category keeps one [`Registry`]. Devices are registered once
//! at init and looked up afterwards, usually by their enumerated name.
//!
//! Nodes are caller-owned and outlive the registry (they usually live in the
//! init function's frame, which never returns), so registration never
//! allocates. Insertion is at the head: the most recently registered device
//! is found first.
//!
//! ```
//! use common::registry::{Named, Node, Registry};
//!
//! #[derive(Clone, Copy, PartialEq, Debug)]
//! enum Led { Red, Green }
//!
//! struct Light { name: Led }
//! impl Named for Light {
//!     type Name = Led;
//!     fn name(&self) -> Led { self.name }
//! }
//!
//! let red = Light { name: Led::Red };
//! let node = Node::new(&red);
//! let leds = Registry::new();
//! leds.register(&node).unwrap();
//! assert!(leds.find_by_name(Led::Red).is_ok());
//! assert!(leds.find_by_name(Led::Green).is_err());
//! ```

use core::cell::Cell;

use platform::{Error, Result};

/// Device addressable by an enumerated name.
pub trait Named {
    /// Name enumeration of the device category.
    type Name: PartialEq + Copy;

    /// This device's name.
    fn name(&self) -> Self::Name;
}

/// Registry link for one device.
pub struct Node<'a, N, T: ?Sized> {
    name: N,
    device: &'a T,
    next: Cell<Option<&'a Node<'a, N, T>>>,
    linked: Cell<bool>,
}

impl<'a, T: Named + ?Sized> Node<'a, T::Name, T> {
    /// Node carrying the device's own name.
    pub fn new(device: &'a T) -> Self {
        Self::with_name(device.name(), device)
    }
}

impl<'a, N, T: ?Sized> Node<'a, N, T> {
    /// Node for a device whose name is not reachable through `&T`, such as
    /// a device wrapped in a `RefCell` for mutable access after lookup.
    pub const fn with_name(name: N, device: &'a T) -> Self {
        Self {
            name,
            device,
            next: Cell::new(None),
            linked: Cell::new(false),
        }
    }

    /// The registered device.
    pub fn device(&self) -> &'a T {
        self.device
    }
}

/// Head of an intrusive singly-linked list of devices.
pub struct Registry<'a, N, T: ?Sized> {
    head: Cell<Option<&'a Node<'a, N, T>>>,
}

impl<'a, N, T: ?Sized> Registry<'a, N, T> {
    /// Empty registry.
    pub const fn new() -> Self {
        Self {
            head: Cell::new(None),
        }
    }

    /// Insert `node` at the head.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] if the node is already linked into a
    /// registry; relinking would corrupt the list.
    pub fn register(&self, node: &'a Node<'a, N, T>) -> Result<()> {
        if node.linked.get() {
            return Err(Error::InvalidArgument);
        }
        node.next.set(self.head.get());
        node.linked.set(true);
        self.head.set(Some(node));
        Ok(())
    }

    /// First device, scanning from the head, for which `matches` is true.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if no device matches.
    pub fn find<F>(&self, mut matches: F) -> Result<&'a T>
    where
        F: FnMut(&T) -> bool,
    {
        self.nodes()
            .find(|node| matches(node.device))
            .map(|node| node.device)
            .ok_or(Error::NotFound)
    }

    /// Iterate devices from most to least recently registered.
    pub fn iter(&self) -> impl Iterator<Item = &'a T> {
        self.nodes().map(|node| node.device)
    }

    /// `true` when nothing has been registered.
    pub fn is_empty(&self) -> bool {
        self.head.get().is_none()
    }

    fn nodes(&self) -> Nodes<'a, N, T> {
        Nodes {
            cursor: self.head.get(),
        }
    }
}

impl<'a, N: PartialEq, T: ?Sized> Registry<'a, N, T> {
    /// Device registered under `name`.
    ///
    /// # Errors
    ///
    /// [`Error::NotFound`] if no device carries that name.
    pub fn find_by_name(&self, name: N) -> Result<&'a T> {
        self.nodes()
            .find(|node| node.name == name)
            .map(|node| node.device)
            .ok_or(Error::NotFound)
    }
}

impl<N, T: ?Sized> Default for Registry<'_, N, T> {
    fn default() -> Self {
        Self::new()
    }
}

struct Nodes<'a, N, T: ?Sized> {
    cursor: Option<&'a Node<'a, N, T>>,
}

impl<'a, N, T: ?Sized> Iterator for Nodes<'a, N, T> {
    type Item = &'a Node<'a, N, T>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.cursor?;
        self.cursor = node.next.get();
        Some(node)
    }
}
