// SPDX-FileCopyrightText: 2026 Quire Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Embedded index schema migrations.

mod embedded {
    use refinery::embed_migrations;
    embed_migrations!("migrations");
}

pub(crate) fn run_migrations(conn: &mut rusqlite::Connection) -> Result<(), refinery::Error> {
    embedded::migrations::runner().run(conn)?;
    Ok(())
}
