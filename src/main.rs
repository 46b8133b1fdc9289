use bitgetx::bitget::{build_connector_with_streams, BitgetStreams};
use bitgetx::core::config::ExchangeConfig;
use bitgetx::core::traits::MarketDataSource;
use bitgetx::core::types::CandleInterval;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    // Public market data works without credentials. Export BITGET_API_KEY,
    // BITGET_SECRET_KEY and BITGET_PASSPHRASE to start the user stream too.
    let config =
        ExchangeConfig::from_env("BITGET").unwrap_or_else(|_| ExchangeConfig::read_only());

    let (connector, streams) = build_connector_with_streams(config, "BTCUSDT").await?;
    let BitgetStreams {
        mut market,
        market_task,
        user,
        user_task,
    } = streams;

    let meta = connector.instrument();
    println!(
        "Resolved {}: price step {}, qty step {}, min qty {}",
        meta.symbol, meta.price_step, meta.qty_step, meta.min_qty
    );

    match connector.fetch_ticker(None).await {
        Ok(ticker) => println!(
            "Ticker: bid {} / ask {} / last {}",
            ticker.bid, ticker.ask, ticker.last
        ),
        Err(e) => println!("Error fetching ticker: {}", e),
    }

    match connector.fetch_ohlcv(None, None, CandleInterval::Min1).await {
        Ok(candles) => {
            println!("Fetched {} candles", candles.len());
            for candle in candles.iter().rev().take(3) {
                println!("  {} close {}", candle.timestamp, candle.close);
            }
        }
        Err(e) => println!("Error fetching candles: {}", e),
    }

    println!("Waiting for live trades...");
    for _ in 0..5 {
        match tokio::time::timeout(std::time::Duration::from_secs(30), market.recv()).await {
            Ok(Some(tick)) => println!(
                "  trade: price {} qty {} buyer_maker {}",
                tick.price, tick.qty, tick.is_buyer_maker
            ),
            Ok(None) => break,
            Err(_) => {
                println!("  no trades within 30s");
                break;
            }
        }
    }

    // Dropping the receivers tells the stream tasks to shut down
    drop(market);
    drop(user);
    let _ = market_task.await;
    if let Some(task) = user_task {
        task.abort();
    }

    Ok(())
}
