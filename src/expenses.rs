//! Expense tracker
//!
//! Owns the description field (with its debounced category suggestion) and
//! the list of committed transactions.

use crate::catalog::{self, FALLBACK_CATEGORY};
use crate::error::CoachError;
use crate::models::{Transaction, TransactionStatus};
use crate::suggest::SuggestionController;
use crate::Result;
use chrono::Utc;
use tracing::info;
use uuid::Uuid;

pub struct ExpenseTracker {
    suggestions: SuggestionController,
    description: String,
    transactions: Vec<Transaction>,
}

impl ExpenseTracker {
    pub fn new(suggestions: SuggestionController) -> Self {
        Self {
            suggestions,
            description: String::new(),
            transactions: Vec::new(),
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn suggestions(&self) -> &SuggestionController {
        &self.suggestions
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Update the description field and schedule a category suggestion
    pub async fn set_description(&mut self, text: &str) {
        self.description = text.to_string();
        self.suggestions.on_input_change(text).await;
    }

    /// Record an expense as `pending` under the settled suggestion or `Other`
    pub async fn commit(&mut self, description: &str, amount: f64) -> Result<Transaction> {
        let description = description.trim();
        if description.is_empty() {
            return Err(CoachError::UserInput("description is required".to_string()));
        }
        if !amount.is_finite() || amount <= 0.0 {
            return Err(CoachError::UserInput(
                "amount must be a positive number".to_string(),
            ));
        }

        let settled = if self.suggestions.is_suggesting().await {
            None
        } else {
            self.suggestions.suggestion().await
        };
        let category = settled.unwrap_or_else(|| FALLBACK_CATEGORY.to_string());

        let transaction = Transaction {
            id: Uuid::new_v4(),
            description: description.to_string(),
            amount,
            category,
            date: Utc::now(),
            status: TransactionStatus::Pending,
        };

        info!(id = %transaction.id, category = %transaction.category, "expense recorded");
        self.transactions.push(transaction.clone());

        self.description.clear();
        self.suggestions.clear().await;

        Ok(transaction)
    }

    /// Accept the recorded category
    pub fn confirm(&mut self, id: Uuid) -> Result<&Transaction> {
        let tx = self.find_mut(id)?;
        tx.status = TransactionStatus::Confirmed;
        Ok(tx)
    }

    /// Override the category; the transaction becomes `confirmed`
    pub fn recategorize(&mut self, id: Uuid, category: &str) -> Result<&Transaction> {
        if !catalog::is_expense_category(category) {
            return Err(CoachError::UserInput(format!(
                "unknown category '{}'",
                category
            )));
        }
        let tx = self.find_mut(id)?;
        tx.category = category.to_string();
        tx.status = TransactionStatus::Confirmed;
        Ok(tx)
    }

    fn find_mut(&mut self, id: Uuid) -> Result<&mut Transaction> {
        self.transactions
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| CoachError::UserInput(format!("no transaction with id {}", id)))
    }
}
