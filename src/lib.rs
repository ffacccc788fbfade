pub mod mermaid;
pub mod relations;
pub mod schema;
pub mod sql;

use wasm_bindgen::prelude::*;

use relations::parse_relations;
use sql::{Dialect, SourceFile, extract_schema};

/// Initialize panic hook for better error messages in WASM
#[wasm_bindgen(start)]
pub fn init() {
    #[cfg(target_arch = "wasm32")]
    console_error_panic_hook::set_once();
}

/// Run the whole pipeline: SQL files in order, plus an optional annotation
/// file, to one Mermaid diagram.
pub fn render_sql_files(
    files: &[SourceFile],
    annotations: Option<&str>,
    dialect: Option<Dialect>,
) -> String {
    let tables = extract_schema(files, dialect);
    let relations = annotations.map(parse_relations).unwrap_or_default();
    tracing::debug!(
        tables = tables.len(),
        relations = relations.len(),
        "rendering diagram"
    );
    mermaid::render(&tables, &relations)
}

/// Render SQL file contents to a Mermaid ER diagram
#[wasm_bindgen(js_name = "sqlToMermaid")]
pub fn sql_to_mermaid(
    files: js_sys::Array,
    annotations: Option<String>,
    dialect: Option<String>,
) -> String {
    let files: Vec<SourceFile> = files
        .iter()
        .enumerate()
        .filter_map(|(i, value)| {
            value
                .as_string()
                .map(|sql| SourceFile::new(format!("file{i}"), sql))
        })
        .collect();

    let dialect = dialect.as_deref().and_then(Dialect::from_str);

    render_sql_files(&files, annotations.as_deref(), dialect)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const USER_ROLES_MYSQL: &str = r#"
        CREATE TABLE users (
            id INT AUTO_INCREMENT PRIMARY KEY,
            email VARCHAR(255) NOT NULL UNIQUE
        ) ENGINE=InnoDB;

        CREATE TABLE roles (
            id INT AUTO_INCREMENT PRIMARY KEY,
            name VARCHAR(64) NOT NULL
        ) ENGINE=InnoDB;

        CREATE TABLE user_roles (
            user_id INT NOT NULL,
            role_id INT NOT NULL,
            PRIMARY KEY (user_id, role_id)
        ) ENGINE=InnoDB;

        ALTER TABLE user_roles ADD CONSTRAINT fk_user_roles_user FOREIGN KEY (user_id) REFERENCES users(id);
        ALTER TABLE user_roles ADD CONSTRAINT fk_user_roles_role FOREIGN KEY (role_id) REFERENCES roles(id);
    "#;

    #[test]
    fn test_user_roles_end_to_end() {
        let files = vec![SourceFile::new("schema.sql", USER_ROLES_MYSQL)];
        let diagram = render_sql_files(&files, None, None);

        let expected = "\
erDiagram
    USERS {
        INT id PK
        VARCHAR(255) email
    }
    ROLES {
        INT id PK
        VARCHAR(64) name
    }
    USER_ROLES {
        INT user_id PK
        INT role_id PK
    }
    USERS ||--o{ USER_ROLES : user_id→id
    ROLES ||--o{ USER_ROLES : role_id→id
";
        assert_eq!(diagram, expected);
    }

    #[test]
    fn test_pipeline_is_idempotent() {
        let files = vec![SourceFile::new("schema.sql", USER_ROLES_MYSQL)];
        let annotations = "Ref member: user_roles.user_id > users.id // many-to-one";

        let first = render_sql_files(&files, Some(annotations), None);
        let second = render_sql_files(&files, Some(annotations), None);
        assert_eq!(first, second);
    }

    #[test]
    fn test_annotations_render_before_foreign_keys() {
        let files = vec![SourceFile::new(
            "pg.sql",
            "CREATE TABLE users (id SERIAL PRIMARY KEY);\nCREATE TABLE profiles (user_id INTEGER PRIMARY KEY);",
        )];
        let annotations = "\
Ref profile_owner: profiles.user_id > users.id // one-to-one
Ref nonsense
Ref audit: profiles.user_id > users.id // many-to-one";

        let diagram = render_sql_files(&files, Some(annotations), None);
        assert!(diagram.ends_with(
            "    USERS ||--|| PROFILES : profile_owner\n    USERS ||--o{ PROFILES : audit\n"
        ));
    }

    #[test]
    fn test_no_files_renders_placeholder() {
        let diagram = render_sql_files(&[], Some("Ref a: b.c > d.e // many"), None);
        assert_eq!(diagram, mermaid::PLACEHOLDER);
    }

    #[test]
    fn test_mixed_dialect_migrations() {
        let files = vec![
            SourceFile::new(
                "001_users.sql",
                "CREATE TABLE users (id BIGSERIAL PRIMARY KEY, avatar BYTEA);",
            ),
            SourceFile::new(
                "002_sessions.sql",
                "CREATE TABLE sessions (id INTEGER PRIMARY KEY AUTOINCREMENT, user_id INTEGER UNIQUE REFERENCES users(id));",
            ),
            SourceFile::new("003_broken.sql", "CREATE TABLE oops (id SERIAL"),
        ];

        let diagram = render_sql_files(&files, None, None);
        assert!(
            diagram.contains("    USERS {\n        BIGSERIAL id PK\n        BYTEA avatar\n    }\n")
        );
        assert!(diagram.contains("        INTEGER user_id FK\n"));
        assert!(diagram.contains("USERS ||--|| SESSIONS : user_id→id"));
        assert!(!diagram.contains("OOPS"));
    }

    #[test]
    fn test_dangling_reference_is_rendered() {
        let files = vec![SourceFile::new(
            "orphans.sql",
            "CREATE TABLE items (id SERIAL PRIMARY KEY, shelf_id INTEGER REFERENCES shelves(id));",
        )];

        let diagram = render_sql_files(&files, None, None);
        assert!(diagram.contains("SHELVES ||--o{ ITEMS : shelf_id→id"));
        assert!(!diagram.contains("SHELVES {"));
    }
}
