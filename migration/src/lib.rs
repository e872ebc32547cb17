pub use sea_orm_migration::prelude::*;

mod m20260830_000001_create_directory_table;
mod m20260830_000002_add_eligibility_tables;
mod m20260830_000003_add_winner_table;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260830_000001_create_directory_table::Migration),
            Box::new(m20260830_000002_add_eligibility_tables::Migration),
            Box::new(m20260830_000003_add_winner_table::Migration),
        ]
    }
}
