pub mod coingecko;
pub mod cryptopanic;
pub mod openrouter;
pub mod util;

pub use coingecko::CoinGeckoProvider;
pub use cryptopanic::CryptoPanicProvider;
pub use openrouter::OpenRouterBackend;
