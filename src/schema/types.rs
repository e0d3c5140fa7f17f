/// Column data type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Text,
}

/// Column definition
#[derive(Debug, Clone)]
pub struct Column {
    pub name: &'static str,
    pub col_type: ColumnType,
    pub nullable: bool,
}

impl Column {
    /// Create an optional (nullable) column
    pub const fn new(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            name,
            col_type,
            nullable: true,
        }
    }

    /// Create a required (non-nullable) column
    pub const fn required(name: &'static str, col_type: ColumnType) -> Self {
        Self {
            name,
            col_type,
            nullable: false,
        }
    }

    /// Value written when an incoming record does not carry this column.
    ///
    /// Text columns default to the empty string so that "not set" has a
    /// single representation; the category-name backfill relies on it.
    pub fn default_value(&self) -> Option<&'static str> {
        match self.col_type {
            ColumnType::Text => Some(""),
            ColumnType::Integer => None,
        }
    }
}

/// Index definition
#[derive(Debug, Clone)]
pub struct Index {
    pub columns: &'static [&'static str],
    pub unique: bool,
}

impl Index {
    /// Create a non-unique index
    pub const fn on(columns: &'static [&'static str]) -> Self {
        Self {
            columns,
            unique: false,
        }
    }

    /// Create a unique index
    pub const fn unique(columns: &'static [&'static str]) -> Self {
        Self {
            columns,
            unique: true,
        }
    }
}

/// Table schema definition
#[derive(Debug, Clone)]
pub struct TableSchema {
    /// Canonical table name, used in the descriptor and in storage
    pub name: &'static str,
    /// Legacy name the same table may appear under in older exports
    pub alias: &'static str,
    /// Whether the descriptor may omit this table
    pub optional: bool,
    pub columns: &'static [Column],
    pub indexes: &'static [Index],
}

impl TableSchema {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Whether a descriptor element name refers to this table
    pub fn matches(&self, tag: &str) -> bool {
        self.name == tag || self.alias == tag
    }

    /// Columns written on insert/update (everything except `id`)
    pub fn data_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.name != "id")
    }
}
