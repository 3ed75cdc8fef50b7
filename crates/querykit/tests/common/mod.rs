//! A recording driver for integration tests.
#![allow(dead_code)]

use querykit::{
    Connection, Cursor, Driver, DriverError, DriverResult, DriverStatement, ParamType, Row, Value,
};
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    Prepare(String),
    Bind(usize, Value, ParamType),
    Execute,
    Fetch(Cursor),
    FetchAll,
    ExecRaw(String),
    Begin,
    Commit,
    Rollback,
}

#[derive(Default)]
pub struct MockState {
    pub events: Vec<Event>,
    /// Rows returned by every fetch.
    pub rows: Vec<Row>,
    pub affected: u64,
    pub last_id: i64,
    pub in_tx: bool,
    pub supports_locks: bool,
    pub fail_execute: Option<String>,
    pub fail_commit: bool,
    pub fail_rollback: bool,
    /// Raw statements starting with this prefix fail.
    pub fail_raw_prefix: Option<String>,
}

impl MockState {
    pub fn raw_statements(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::ExecRaw(sql) => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn binds(&self) -> Vec<(usize, Value, ParamType)> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Bind(i, v, t) => Some((*i, v.clone(), *t)),
                _ => None,
            })
            .collect()
    }

    pub fn prepared(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Prepare(sql) => Some(sql.clone()),
                _ => None,
            })
            .collect()
    }
}

pub type Shared = Rc<RefCell<MockState>>;

pub struct MockDriver {
    state: Shared,
}

impl MockDriver {
    pub fn new(state: Shared) -> Self {
        Self { state }
    }
}

/// A connection over a fresh mock driver that understands table locks.
pub fn mock_connection() -> (Connection, Shared) {
    let state: Shared = Rc::new(RefCell::new(MockState {
        supports_locks: true,
        ..MockState::default()
    }));
    let conn = Connection::new("mock", Box::new(MockDriver::new(Rc::clone(&state))));
    (conn, state)
}

pub fn row(pairs: &[(&str, Value)]) -> Row {
    Row::new(
        pairs.iter().map(|(c, _)| c.to_string()).collect(),
        pairs.iter().map(|(_, v)| v.clone()).collect(),
    )
}

struct MockStatement {
    state: Shared,
    position: isize,
}

impl DriverStatement for MockStatement {
    fn bind(&mut self, position: usize, value: &Value, hint: ParamType) -> DriverResult<()> {
        self.state
            .borrow_mut()
            .events
            .push(Event::Bind(position, value.clone(), hint));
        Ok(())
    }

    fn execute(&mut self) -> DriverResult<()> {
        let mut state = self.state.borrow_mut();
        state.events.push(Event::Execute);
        match &state.fail_execute {
            Some(message) => Err(DriverError::new(message.clone()).with_code("23000")),
            None => Ok(()),
        }
    }

    fn fetch_one(&mut self, cursor: Cursor) -> DriverResult<Option<Row>> {
        let mut state = self.state.borrow_mut();
        state.events.push(Event::Fetch(cursor));
        let target = match cursor {
            Cursor::Next => self.position + 1,
            Cursor::Prior => self.position - 1,
            Cursor::First => 0,
            Cursor::Last => state.rows.len() as isize - 1,
            Cursor::Absolute(n) => n as isize,
            Cursor::Relative(n) => self.position + n,
        };
        self.position = target;
        Ok(usize::try_from(target)
            .ok()
            .and_then(|i| state.rows.get(i).cloned()))
    }

    fn fetch_all(&mut self) -> DriverResult<Vec<Row>> {
        let mut state = self.state.borrow_mut();
        state.events.push(Event::FetchAll);
        Ok(state.rows.clone())
    }

    fn row_count(&self) -> u64 {
        self.state.borrow().affected
    }
}

impl Driver for MockDriver {
    fn prepare(&mut self, sql: &str) -> DriverResult<Box<dyn DriverStatement + '_>> {
        self.state
            .borrow_mut()
            .events
            .push(Event::Prepare(sql.to_string()));
        Ok(Box::new(MockStatement {
            state: Rc::clone(&self.state),
            position: -1,
        }))
    }

    fn exec_raw(&mut self, sql: &str) -> DriverResult<u64> {
        let mut state = self.state.borrow_mut();
        state.events.push(Event::ExecRaw(sql.to_string()));
        match &state.fail_raw_prefix {
            Some(prefix) if sql.starts_with(prefix.as_str()) => {
                Err(DriverError::new(format!("{prefix} failed")))
            }
            _ => Ok(0),
        }
    }

    fn last_insert_id(&self) -> DriverResult<i64> {
        Ok(self.state.borrow().last_id)
    }

    fn begin(&mut self) -> DriverResult<()> {
        let mut state = self.state.borrow_mut();
        state.events.push(Event::Begin);
        state.in_tx = true;
        Ok(())
    }

    fn commit(&mut self) -> DriverResult<()> {
        let mut state = self.state.borrow_mut();
        state.events.push(Event::Commit);
        state.in_tx = false;
        if state.fail_commit {
            return Err(DriverError::new("commit failed"));
        }
        Ok(())
    }

    fn rollback(&mut self) -> DriverResult<()> {
        let mut state = self.state.borrow_mut();
        state.events.push(Event::Rollback);
        state.in_tx = false;
        if state.fail_rollback {
            return Err(DriverError::new("rollback failed"));
        }
        Ok(())
    }

    fn in_transaction(&self) -> bool {
        self.state.borrow().in_tx
    }

    fn supports_table_locks(&self) -> bool {
        self.state.borrow().supports_locks
    }
}
