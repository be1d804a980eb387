use indexmap::IndexMap;

/* How a registry entry is laid out on the wire */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
    /* The type occupies the given number of bytes as-is */
    Native(u64),
    /* The type has no wire form of its own and is stored as the named entry */
    Cast(&'static str),
}

/* Value domain of a registry entry, used to validate literals */
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeClass {
    Unsigned,
    Signed,
    Float,
    Bool,
    Enum,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeEntry {
    pub name: &'static str,
    pub storage: Storage,
    pub class: TypeClass,
}

/// Closed table of primitive wire types and their storage.
///
/// The registry is an immutable value: build it once with
/// [`TypeRegistry::standard`] and pass it to whatever needs sizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRegistry {
    entries: IndexMap<&'static str, TypeEntry>,
}

impl TypeRegistry {
    pub const BOOL: &'static str = "bool";
    pub const ENUM: &'static str = "enum";
    pub const BYTE: &'static str = "uint8_t";

    pub fn standard() -> Self {
        let table = [
            ("uint8_t", Storage::Native(1), TypeClass::Unsigned),
            ("uint16_t", Storage::Native(2), TypeClass::Unsigned),
            ("uint32_t", Storage::Native(4), TypeClass::Unsigned),
            ("uint64_t", Storage::Native(8), TypeClass::Unsigned),
            ("int8_t", Storage::Native(1), TypeClass::Signed),
            ("int16_t", Storage::Native(2), TypeClass::Signed),
            ("int32_t", Storage::Native(4), TypeClass::Signed),
            ("int64_t", Storage::Native(8), TypeClass::Signed),
            ("float", Storage::Native(4), TypeClass::Float),
            ("double", Storage::Native(8), TypeClass::Float),
            (Self::BOOL, Storage::Cast(Self::BYTE), TypeClass::Bool),
            (Self::ENUM, Storage::Cast(Self::BYTE), TypeClass::Enum),
        ];

        let entries = table
            .into_iter()
            .map(|(name, storage, class)| (name, TypeEntry { name, storage, class }))
            .collect();

        Self { entries }
    }

    pub fn get(&self, name: &str) -> Option<&TypeEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /* Registered type names in table order */
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().copied()
    }

    /* True when the type is stored as a different entry (bool, enum) */
    pub fn is_cast(&self, name: &str) -> bool {
        matches!(self.get(name), Some(TypeEntry { storage: Storage::Cast(_), .. }))
    }

    /* Name of the entry that actually occupies the wire for `name` */
    pub fn storage_type(&self, name: &str) -> Option<&'static str> {
        let entry = self.get(name)?;
        match entry.storage {
            Storage::Native(_) => Some(entry.name),
            Storage::Cast(target) => self.storage_type(target),
        }
    }

    /* Width in bytes of the resolved storage type */
    pub fn width(&self, name: &str) -> Option<u64> {
        let storage = self.storage_type(name)?;
        match self.get(storage)?.storage {
            Storage::Native(width) => Some(width),
            Storage::Cast(_) => None,
        }
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
