// SPDX-FileCopyrightText: 2026 Recall Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Built-in prompt texts used as configuration defaults.

/// Default assistant system prompt. `{date}` is replaced once per session.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are an AI assistant that helps insurance agents \
to find information on customers data and status. Use a professional tone when answering and \
provide a summary of data instead of lists. If users ask about topics you don't know, answer \
that you don't know. Today's date is {date}. Query the database at every user request, even if \
information is available in chat history, to make sure you always have the latest information.";

/// Schema description for the sample `sessions` table.
pub const SESSIONS_SCHEMA_PROMPT: &str = r#"You create SQLite queries based on the given user request.
The database has one table of conference sessions:

CREATE TABLE sessions (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    abstract TEXT NOT NULL,
    external_id TEXT NOT NULL,
    details TEXT -- JSON document
);

The `details` column holds a JSON object with these keys:
- speakers: array of speaker names
- track: the conference track, for example "AI" or "Data"
- language: the language the session is delivered in
- level: the session level, one of 100, 200, 300, 400

Use json_extract(details, '$.track') to read scalar values from `details`.
Use json_each(details, '$.speakers') to expand the speakers array, for example
SELECT s.title FROM sessions s, json_each(s.details, '$.speakers') sp WHERE sp.value = 'Jane Doe'.
Use LIKE with % wildcards for partial text matches on title and abstract."#;

/// Default description of the similar-sessions tool shown to the model.
pub const SIMILAR_SESSIONS_DESCRIPTION: &str =
    "Return conference sessions whose title or abstract match the given topic, best match first.";

/// Default description of the free-form query tool shown to the model.
pub const QUERY_DATABASE_DESCRIPTION: &str =
    "Query the conference sessions database. Pass the user's data request in plain language.";
