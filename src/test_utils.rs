/// # Test Utilities Module
///
/// Fixture infrastructure for exercising the ORM against known data. The
/// fixture collaborator owns everything the core deliberately does not:
/// creating tables and loading baseline rows before a scenario runs. Each
/// fixture is an isolated in-memory database, so tests reset state by
/// building a fresh fixture rather than by cleaning up through the core.
use crate::core::db::Db;
use crate::core::Result;

/// Baseline schema: a user table with a conventional integer primary key,
/// plus a profile table for scenarios needing a second table.
const FIXTURE_SCHEMA: &str = "
CREATE TABLE user (
    id INTEGER PRIMARY KEY,
    username TEXT UNIQUE,
    description TEXT,
    age INTEGER
);

CREATE TABLE profile (
    id INTEGER PRIMARY KEY,
    description TEXT,
    level INTEGER
);
";

/// Baseline rows. Ages are chosen so that filtering below 45 splits the
/// set: john and guest match, test does not.
const FIXTURE_ROWS: &str = "
INSERT INTO user (id, username, description, age) VALUES (1, 'john', 'Admin User', 30);
INSERT INTO user (id, username, description, age) VALUES (2, 'test', 'Testing User', 50);
INSERT INTO user (id, username, description, age) VALUES (3, 'guest', 'Guest User', 40);

INSERT INTO profile (id, description, level) VALUES (1, 'Administrator', 9);
INSERT INTO profile (id, description, level) VALUES (2, 'Visitor', 1);
";

/// An isolated test database with the baseline schema and rows.
pub struct DatabaseFixture {
    pub db: Db,
}

impl DatabaseFixture {
    /// Creates a fixture with schema only, no rows.
    pub fn empty() -> Result<DatabaseFixture> {
        let db = Db::open_in_memory()?;
        db.execute_batch(FIXTURE_SCHEMA)?;
        Ok(DatabaseFixture { db })
    }

    /// Creates a fixture with the baseline schema and seed rows.
    pub fn with_sample_data() -> Result<DatabaseFixture> {
        let fixture = DatabaseFixture::empty()?;
        fixture.db.execute_batch(FIXTURE_ROWS)?;
        Ok(fixture)
    }
}
