//! Centralized constants for marquee.
//!
//! All magic numbers, default strings, and prompt text live here so they can
//! be changed in one place.

/// Application name used in CLI output and directory paths.
pub const APP_NAME: &str = "marquee";

/// Configuration filename.
pub const CONFIG_FILENAME: &str = "config.toml";

/// Per-project configuration filename.
pub const PROJECT_CONFIG_FILENAME: &str = "marquee.toml";

/// Readline history filename.
pub const HISTORY_FILENAME: &str = "chat_history.txt";

// --- Provider defaults ---

/// Default provider when none is configured.
pub const DEFAULT_PROVIDER: &str = "openai";

/// Default LLM model identifier.
pub const DEFAULT_MODEL: &str = "gpt-4o";

/// Default model for Anthropic.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-5";

/// Default model for OpenRouter.
pub const DEFAULT_OPENROUTER_MODEL: &str = "openai/gpt-4o";

/// Default base URL for local Ollama server.
pub const OLLAMA_DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Default model for Ollama.
pub const OLLAMA_DEFAULT_MODEL: &str = "llama3";

// --- Generation defaults ---

/// Sampling temperature for the main answer stream.
pub const DEFAULT_TEMPERATURE: f64 = 0.2;

/// Maximum tokens for the main answer stream.
pub const DEFAULT_MAX_TOKENS: u64 = 1000;

/// Sampling temperature for the review enrichment query.
pub const ENRICHMENT_TEMPERATURE: f64 = 0.2;

/// Maximum tokens for the review enrichment query. The answer is a small
/// JSON object.
pub const ENRICHMENT_MAX_TOKENS: u64 = 300;

// --- Turn loop ---

/// Action dispatches allowed per user turn before the loop is cut short.
pub const DEFAULT_MAX_ACTION_ITERATIONS: usize = 8;

/// Seconds to wait on a completion, enrichment query, or action before
/// giving up on the turn.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 120;

// --- Movie data ---

/// TMDB v3 API root.
pub const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";

/// SerpApi search endpoint used for showtimes.
pub const SERPAPI_BASE_URL: &str = "https://serpapi.com/search.json";

/// Reviews included in a `get_reviews` result.
pub const REVIEW_LIMIT: usize = 5;

/// Characters kept from each review body.
pub const REVIEW_EXCERPT_CHARS: usize = 500;

// --- Prompts ---

/// Behavioral contract that opens every transcript.
pub const SYSTEM_PROMPT: &str = r#"You are a helpful assistant with knowledge about movies. Your primary tasks are:

1. Respond to user queries about movies and provide information.
2. Detect when a user is requesting specific movie-related actions.
3. A user may make multiple requests in a single chat session, or the same request repeatedly.
4. When a specific action is requested, generate a function call instead of a direct response.
5. If there is no function call needed, respond directly to the user with your knowledge about movies, or let the user know if you don't have the answer.
6. If there is a function call, respond back to the user with the results of the function call appropriately. If the function call returns an empty result, let the user know.

For function calls, use the following format:
{"function": "function_name", "parameters": {"param1": "value1", "param2": "value2"}}

Make sure that only json is returned and no other text is a part of the response to a function call request.

The list of functions you can call are:
- get_now_playing_movies(): Use when the user asks for current or now playing movies.
- get_showtimes(title, location): List the showtimes of a movie in a specific location. The location can be a city or zip code. If the location is missing or unknown, ask the user for the city and state or zip code.
- confirm_ticket_purchase(theater, movie, showtime): Use when the user wants to purchase a ticket for a specific movie, theater, and showtime. Make sure you have all of this information first. It asks the user for confirmation.
- buy_ticket(theater, movie, showtime): Buy a ticket. Only call this after confirm_ticket_purchase and after the user has confirmed the purchase.
- get_reviews(movie_id): Use when the user requests reviews for a specific movie. Summarize the reviews with the audience and critic scores, a few key quotes with links to the full reviews, and some notable moments from the film without revealing the plot.

Only generate a function call when the user explicitly requests information that requires one of these functions.
For all other queries, respond directly to the user with your knowledge about movies.

After receiving the results of a function call, incorporate that information into your response to the user.

Examples:
1. User: "What movies are playing now?"
   Function call: {"function": "get_now_playing_movies", "parameters": {}}

2. User: "What are the showtimes for Inception in New York?"
   Function call: {"function": "get_showtimes", "parameters": {"title": "Inception", "location": "New York"}}

3. User: "I want to buy a ticket for Avengers at AMC Theater for the 7 PM show."
   Function call: {"function": "confirm_ticket_purchase", "parameters": {"theater": "AMC Theater", "movie": "Avengers", "showtime": "7 PM"}}

4. User: "Can you get me reviews for The Godfather?"
   Function call: {"function": "get_reviews", "parameters": {"movie_id": "The Godfather"}}

Remember, only use these function calls when necessary. For general movie questions or discussions, respond directly using your knowledge."#;

/// Instructions for the review enrichment query. The rendered conversation
/// and latest message are appended after this text.
pub const ENRICHMENT_PROMPT: &str = r#"Based on the conversation, determine if the topic is about a specific movie.

Determine if the user is asking a question that would be aided by knowing what critics are saying about the movie.
Determine if the reviews for that movie have already been provided in the conversation. If so, do not fetch reviews.

Your only role is to evaluate the conversation and the latest user message, and decide whether to fetch reviews.

Output the current movie, its id, a boolean to fetch reviews, and your rationale as a single JSON object. Do not output a code block.

{"movie": "title", "id": 123, "fetch_reviews": true, "rationale": "reasoning"}

If you think reviews should not be fetched, set fetch_reviews to false.
All responses must use the JSON format above. If there is no movie in the conversation, set movie and id to null."#;
