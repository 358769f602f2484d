//! Paper executor.

use std::sync::Arc;

use fxbot_core::{TradeRecord, TradeSource, TradingSignal};
use fxbot_persistence::TradeJournal;
use tracing::info;

use crate::error::ExecutionResult;
use crate::executor::{BoxFuture, ExecutionReport, TradeExecutor};

/// Accepts every signal and appends it to the trade journal.
pub struct PaperExecutor {
    journal: Arc<TradeJournal>,
}

impl PaperExecutor {
    pub fn new(journal: Arc<TradeJournal>) -> Self {
        Self { journal }
    }
}

impl TradeExecutor for PaperExecutor {
    fn execute<'a>(
        &'a self,
        signal: &'a TradingSignal,
        source: TradeSource,
    ) -> BoxFuture<'a, ExecutionResult<ExecutionReport>> {
        Box::pin(async move {
            let trade = TradeRecord::from_signal(signal, source);
            self.journal.record(&trade)?;
            info!(
                trade_id = %trade.id,
                source = %trade.source,
                signal = %signal,
                "Paper trade recorded"
            );
            Ok(ExecutionReport::new(trade, self.name()))
        })
    }

    fn name(&self) -> &'static str {
        "paper"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use fxbot_core::{ChannelId, TradeAction};
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_paper_trade_is_journaled() {
        let temp_dir = TempDir::new().unwrap();
        let journal = Arc::new(TradeJournal::new(temp_dir.path()));
        let executor = PaperExecutor::new(journal.clone());

        let signal =
            TradingSignal::new(TradeAction::Buy, "EURUSD", dec!(1.05), dec!(1.045), dec!(1.06))
                .unwrap();
        let source = TradeSource::Channel(ChannelId::from_chat_id(-100));
        let report = executor.execute(&signal, source.clone()).await.unwrap();

        assert_eq!(report.venue, "paper");
        assert_eq!(report.trade.source, source);
        assert_eq!(report.trade.price, dec!(1.05));

        let journaled = journal.read_day(Utc::now().date_naive()).unwrap();
        assert_eq!(journaled, vec![report.trade]);
    }
}
