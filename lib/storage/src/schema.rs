/// Idempotent schema bootstrap, run once at startup.
pub(crate) const SCHEMA: &[&str] = &[
    "CREATE TABLE IF NOT EXISTS blocks (\
        number BIGINT PRIMARY KEY, \
        hash TEXT NOT NULL, \
        block JSONB NOT NULL, \
        created TIMESTAMPTZ)",
    "CREATE INDEX IF NOT EXISTS blocks_hash_idx ON blocks (hash)",
    "CREATE TABLE IF NOT EXISTS transactions (\
        block_num BIGINT NOT NULL REFERENCES blocks (number), \
        hash TEXT PRIMARY KEY, \
        transaction JSONB NOT NULL, \
        created TIMESTAMPTZ)",
    "CREATE TABLE IF NOT EXISTS state (\
        block_num BIGINT NOT NULL REFERENCES blocks (number), \
        key TEXT PRIMARY KEY, \
        value JSONB, \
        updated TIMESTAMPTZ, \
        created TIMESTAMPTZ)",
    "CREATE TABLE IF NOT EXISTS rewards (\
        block_num BIGINT NOT NULL REFERENCES blocks (number), \
        key TEXT NOT NULL, \
        value JSONB, \
        reward JSONB, \
        created TIMESTAMPTZ, \
        PRIMARY KEY (block_num, key))",
    "CREATE TABLE IF NOT EXISTS contracts (\
        block_num BIGINT NOT NULL REFERENCES blocks (number), \
        name TEXT PRIMARY KEY, \
        code TEXT, \
        lst001 BOOLEAN NOT NULL DEFAULT FALSE, \
        lst002 BOOLEAN NOT NULL DEFAULT FALSE, \
        lst003 BOOLEAN NOT NULL DEFAULT FALSE, \
        created TIMESTAMPTZ)",
    "CREATE TABLE IF NOT EXISTS addresses (\
        block_num BIGINT NOT NULL REFERENCES blocks (number), \
        address TEXT PRIMARY KEY, \
        created TIMESTAMPTZ)",
];
