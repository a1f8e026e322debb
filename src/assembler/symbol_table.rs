//! Label symbol table.
//!
//! Pass 1 defines symbols at their cumulative byte offset; pass 2 resolves
//! operand references against the finished table. Duplicate definitions are
//! rejected at define time so the error can name both source lines.

/// A defined label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    pub name: String,

    /// Byte address of the next instruction or data byte after the label.
    pub address: u8,

    /// 1-indexed source line of the definition.
    pub defined_at: usize,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
}

impl SymbolTable {
    #[must_use]
    pub fn new() -> Self {
        SymbolTable::default()
    }

    /// Defines a label. On a duplicate, returns the existing symbol so the
    /// caller can report where the first definition lives.
    pub fn define(&mut self, name: String, address: u8, line: usize) -> Result<(), &Symbol> {
        if let Some(index) = self.symbols.iter().position(|s| s.name == name) {
            return Err(&self.symbols[index]);
        }
        self.symbols.push(Symbol {
            name,
            address,
            defined_at: line,
        });
        Ok(())
    }

    /// Resolves a label reference to its address.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<u8> {
        self.symbols
            .iter()
            .find(|s| s.name == name)
            .map(|s| s.address)
    }

    #[must_use]
    pub fn into_symbols(self) -> Vec<Symbol> {
        self.symbols
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_and_lookup() {
        let mut table = SymbolTable::new();
        table.define("start".to_string(), 0x00, 1).unwrap();
        table.define("loop".to_string(), 0x04, 3).unwrap();

        assert_eq!(table.lookup("loop"), Some(0x04));
        assert_eq!(table.lookup("start"), Some(0x00));
        assert_eq!(table.lookup("missing"), None);
    }

    #[test]
    fn test_duplicate_reports_first_definition() {
        let mut table = SymbolTable::new();
        table.define("loop".to_string(), 0x00, 2).unwrap();

        let first = table.define("loop".to_string(), 0x08, 9).unwrap_err();
        assert_eq!(first.defined_at, 2);
        assert_eq!(first.address, 0x00);
    }

    #[test]
    fn test_labels_are_case_sensitive() {
        let mut table = SymbolTable::new();
        table.define("Loop".to_string(), 0x02, 1).unwrap();
        assert_eq!(table.lookup("loop"), None);
    }
}
