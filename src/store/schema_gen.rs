use crate::schema::{ColumnType, TableSchema};

/// Generate CREATE TABLE SQL for a table schema
pub fn generate_create_table(schema: &TableSchema) -> String {
    let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (\n", schema.name);
    let mut columns = Vec::new();

    for col in schema.columns {
        if col.name == "id" {
            columns.push("    id INTEGER PRIMARY KEY AUTOINCREMENT".to_string());
            continue;
        }

        let sql_type = match col.col_type {
            ColumnType::Integer => "INTEGER",
            ColumnType::Text => "TEXT",
        };

        let constraint = match (col.nullable, col.default_value()) {
            (false, Some(default)) => format!(" NOT NULL DEFAULT '{}'", default),
            (false, None) => " NOT NULL".to_string(),
            (true, Some(default)) => format!(" DEFAULT '{}'", default),
            (true, None) => String::new(),
        };

        columns.push(format!("    {} {}{}", col.name, sql_type, constraint));
    }

    sql.push_str(&columns.join(",\n"));
    sql.push_str("\n)");

    sql
}

/// Generate CREATE INDEX statements for the schema's declared indexes
pub fn generate_indexes(schema: &TableSchema) -> Vec<String> {
    schema
        .indexes
        .iter()
        .map(|index| {
            format!(
                "CREATE {}INDEX IF NOT EXISTS idx_{}_{} ON {}({})",
                if index.unique { "UNIQUE " } else { "" },
                schema.name,
                index.columns.join("_"),
                schema.name,
                index.columns.join(", ")
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::tables::{COMPONENTS, COMPONENT_FLAVORS};

    #[test]
    fn test_generate_create_table() {
        let sql = generate_create_table(&COMPONENTS);
        assert!(sql.contains("CREATE TABLE IF NOT EXISTS elements_component"));
        assert!(sql.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(sql.contains("name TEXT NOT NULL DEFAULT ''"));
        assert!(sql.contains("compcat INTEGER,"));
        assert!(sql.contains("css TEXT DEFAULT ''"));
    }

    #[test]
    fn test_generate_indexes() {
        let indexes = generate_indexes(&COMPONENT_FLAVORS);
        assert!(indexes.iter().any(|i| i.contains(
            "UNIQUE INDEX IF NOT EXISTS idx_elements_comp_flavor_componentname_flavorname"
        )));
        assert!(indexes
            .iter()
            .any(|i| i.starts_with("CREATE INDEX IF NOT EXISTS idx_elements_comp_flavor_flavorname")));
    }
}
