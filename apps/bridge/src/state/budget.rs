//! # Budget State
//!
//! Holds the session's [`BudgetEngine`] and the current markup.
//!
//! ## Thread Safety
//! The engine is wrapped in `Arc<Mutex<T>>` because:
//! 1. The IPC loop and the rate fetch task both touch it
//! 2. Only one of them may mutate it at a time
//! 3. Every lock is held for a synchronous closure only, never across `.await`

use std::sync::{Arc, Mutex, PoisonError};

use cambio_core::{Aggregates, BudgetEngine, Markup};

/// Shared handle to the budget session.
#[derive(Clone)]
pub struct BudgetState {
    engine: Arc<Mutex<BudgetEngine>>,
    markup: Arc<Mutex<Markup>>,
}

impl BudgetState {
    /// Creates the state around an engine and the starting markup.
    pub fn new(engine: BudgetEngine, markup: Markup) -> Self {
        BudgetState {
            engine: Arc::new(Mutex::new(engine)),
            markup: Arc::new(Mutex::new(markup)),
        }
    }

    /// Executes a function with read access to the engine.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let count = budget.with_engine(|engine| engine.items().len());
    /// ```
    pub fn with_engine<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&BudgetEngine) -> R,
    {
        // Engine mutations are single steps; a poisoned lock is still consistent.
        let engine = self.engine.lock().unwrap_or_else(PoisonError::into_inner);
        f(&engine)
    }

    /// Executes a function with write access to the engine.
    ///
    /// ## Usage
    /// ```rust,ignore
    /// budget.with_engine_mut(|engine| engine.add_item(&draft))?;
    /// ```
    pub fn with_engine_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut BudgetEngine) -> R,
    {
        let mut engine = self.engine.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut engine)
    }

    /// The markup applied to final totals.
    pub fn markup(&self) -> Markup {
        *self.markup.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn set_markup(&self, markup: Markup) {
        *self.markup.lock().unwrap_or_else(PoisonError::into_inner) = markup;
    }

    /// Computes aggregates with the current markup.
    pub fn aggregates(&self) -> Aggregates {
        let markup = self.markup();
        self.with_engine(|engine| engine.compute_aggregates(markup))
    }
}

impl Default for BudgetState {
    fn default() -> Self {
        Self::new(BudgetEngine::new(), Markup::NONE)
    }
}
