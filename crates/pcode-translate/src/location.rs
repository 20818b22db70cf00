use pcode_sys::api::TranslationContext;
use pcode_sys::sys::{self, SpaceHandle};

use crate::session::Session;
use crate::space::{AddrSpace, Endianness};

/// An address is represented by an offset into an address space
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address {
    pub space: AddrSpace,

    /// The standard interpretation of the offset is an index into the associated address space.
    /// However, when used in conjunction with the constant address space, the offset is the actual
    /// value.
    pub offset: u64,
}

impl Address {
    pub fn new(space: AddrSpace, offset: u64) -> Self {
        Self { space, offset }
    }

    /// Copy a raw address reported by the engine of `session`.
    pub fn from_raw<C: TranslationContext>(
        session: &Session<C>,
        address: &sys::RawAddress,
    ) -> Self {
        Self {
            space: session.resolve_space(address.space),
            offset: address.offset,
        }
    }

    pub fn is_constant(&self) -> bool {
        self.space.is_constant()
    }

    pub fn endianness(&self) -> Endianness {
        self.space.endianness()
    }

    /// The space operand of `LOAD` and `STORE` is a constant whose offset encodes the address
    /// space being accessed. Decodes that space.
    ///
    /// # Panics
    ///
    /// Panics if this address is not in the constant space, or if it belongs to another session.
    pub fn space_from_constant<C: TranslationContext>(&self, session: &Session<C>) -> AddrSpace {
        assert!(self.is_constant(), "address {self} is not in the constant space");
        session.assert_owns(&self.space);

        let handle = SpaceHandle::from_constant_offset(self.offset).unwrap_or_else(|| {
            panic!(
                "constant {offset:#x} does not encode an address space",
                offset = self.offset
            )
        });

        session.resolve_space(handle)
    }
}

impl std::fmt::Debug for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Address")
            .field("space", &self.space.name())
            .field("offset", &format!("{offset:#016x}", offset = &self.offset))
            .finish()
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{:#x}", self.space, self.offset)
    }
}

/// A Varnode represents a sized storage location or immediate value. Equality is structural, so a
/// varnode may be used as a key to deduplicate locations.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Varnode {
    pub space: AddrSpace,
    pub offset: u64,
    pub size: usize,
}

impl Varnode {
    pub fn new(space: AddrSpace, offset: u64, size: usize) -> Self {
        Self {
            space,
            offset,
            size,
        }
    }

    pub fn from_raw<C: TranslationContext>(
        session: &Session<C>,
        varnode: &sys::RawVarnode,
    ) -> Self {
        Self {
            space: session.resolve_space(varnode.space),
            offset: varnode.offset,
            size: varnode.size.try_into().unwrap_or_else(|err| {
                panic!("unable to convert varnode size {size}: {err}", size = varnode.size)
            }),
        }
    }

    pub fn address(&self) -> Address {
        Address::new(self.space.clone(), self.offset)
    }

    pub fn is_constant(&self) -> bool {
        self.space.is_constant()
    }

    /// See [Address::space_from_constant].
    pub fn space_from_constant<C: TranslationContext>(&self, session: &Session<C>) -> AddrSpace {
        self.address().space_from_constant(session)
    }

    /// The name of the register at this location, if there is one.
    pub fn register_name<C: TranslationContext>(&self, session: &Session<C>) -> Option<String> {
        session.register_name(self)
    }
}

impl Ord for Varnode {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        match (&self.space, self.offset).cmp(&(&other.space, other.offset)) {
            std::cmp::Ordering::Equal => (),
            ord => return ord,
        }

        // Larger size should come first
        other.size.cmp(&self.size)
    }
}

impl PartialOrd for Varnode {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl std::fmt::Debug for Varnode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Varnode({self})")
    }
}

impl std::fmt::Display for Varnode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{:#x}:{}]", self.space, self.offset, self.size)
    }
}
