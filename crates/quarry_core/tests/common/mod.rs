use std::sync::Arc;

use quarry_core::analyzer::Analyzer;
use quarry_core::catalog::Catalog;
use quarry_core::catalog::memory::{MemoryDatabase, MemoryTable};
use quarry_core::catalog::view::ViewRegistry;
use quarry_core::config::session::SessionConfig;
use quarry_core::context::ExecutionContext;
use quarry_core::execution::execute;
use quarry_core::logical::operator::LogicalOperator;
use quarry_core::types::Row;
use quarry_core::types::datatype::DataType;
use quarry_core::types::scalar::ScalarValue;
use quarry_core::types::schema::{Column, Schema};
use quarry_error::Result;

pub struct TestEnv {
    pub database: Arc<MemoryDatabase>,
    pub catalog: Arc<Catalog>,
    pub views: Arc<ViewRegistry>,
    pub analyzer: Analyzer,
}

/// Database "mydb" with:
///
/// - "mytable" (i Int64, s Utf8), three rows
/// - "reports" versioned at 2019-01-01 and 2019-01-02, plus a current version
pub fn test_env() -> TestEnv {
    logutil::init_test();

    let database = Arc::new(MemoryDatabase::new("mydb"));
    database.add_table(
        MemoryTable::with_rows(
            "mytable",
            Schema::new([
                Column::new("i", DataType::Int64, false),
                Column::new("s", DataType::Utf8, false),
            ]),
            vec![
                vec![ScalarValue::Int64(1), "first row".into()],
                vec![ScalarValue::Int64(2), "second row".into()],
                vec![ScalarValue::Int64(3), "third row".into()],
            ],
        )
        .unwrap(),
    );

    let reports = || Schema::new([Column::new("total", DataType::Int64, false)]);
    for (as_of, total) in [("2019-01-01", 10), ("2019-01-02", 20)] {
        database.add_table_version(
            ScalarValue::from(as_of),
            MemoryTable::with_rows("reports", reports(), vec![vec![ScalarValue::Int64(total)]])
                .unwrap(),
        );
    }
    database.add_table(
        MemoryTable::with_rows("reports", reports(), vec![vec![ScalarValue::Int64(30)]]).unwrap(),
    );

    let catalog = Arc::new(Catalog::new());
    catalog.add_database(database.clone());
    let views = Arc::new(ViewRegistry::new());
    let analyzer = Analyzer::new(catalog.clone(), views.clone());

    TestEnv {
        database,
        catalog,
        views,
        analyzer,
    }
}

impl TestEnv {
    pub fn context(&self) -> ExecutionContext {
        ExecutionContext::new("mydb", Arc::new(SessionConfig::default()))
    }

    pub fn run(&self, plan: LogicalOperator) -> Result<Vec<Row>> {
        let ctx = self.context();
        let plan = self.analyzer.analyze(&ctx, plan)?;
        execute(&ctx, &self.catalog, &plan)
    }
}
