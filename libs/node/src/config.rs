use crate::address::EEPROM_ADDRESS_OFFSET;

/// Identity strings reported by the property operations.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeProperties {
    pub name: &'static str,
    pub manufacturer: &'static str,
    pub software_version: &'static str,
    pub url: &'static str,
}

impl NodeProperties {
    pub const fn new(
        name: &'static str,
        manufacturer: &'static str,
        software_version: &'static str,
        url: &'static str,
    ) -> Self {
        Self {
            name,
            manufacturer,
            software_version,
            url,
        }
    }
}

impl NodeProperties {
    pub const DEFAULT: Self = Self::new(env!("CARGO_PKG_NAME"), "", env!("CARGO_PKG_VERSION"), "");
}

impl Default for NodeProperties {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NodeConfig {
    /// Reserved non-volatile offset holding the bus address.
    pub address_offset: u16,
    pub properties: NodeProperties,
}

impl NodeConfig {
    pub const DEFAULT: Self = Self::new(EEPROM_ADDRESS_OFFSET, NodeProperties::DEFAULT);

    pub const fn new(address_offset: u16, properties: NodeProperties) -> Self {
        Self {
            address_offset,
            properties,
        }
    }

    pub const fn with_properties(mut self, properties: NodeProperties) -> Self {
        self.properties = properties;
        self
    }

    pub const fn with_address_offset(mut self, address_offset: u16) -> Self {
        self.address_offset = address_offset;
        self
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
