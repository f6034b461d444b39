/// Keys for the centrally authored SQL statements.
///
/// Timestamp parameters are bound as text and cast server-side, so the
/// `-infinity` genesis sentinel and HLC wall-clock strings go through the
/// same code path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statement {
    BlockUpsert,
    TransactionUpsert,
    RewardInsert,
    StateUpsert,
    ContractUpsert,
    AddressInsert,
    BlockByNumber,
    BlockByHash,
    StateBlockNum,
    AddressBlockNum,
}

impl Statement {
    pub fn sql(self) -> &'static str {
        match self {
            Self::BlockUpsert => {
                "INSERT INTO blocks (number, hash, block, created) \
                 VALUES ($1, $2, $3, CAST($4 AS TIMESTAMPTZ)) \
                 ON CONFLICT (number) DO UPDATE SET \
                 hash = EXCLUDED.hash, block = EXCLUDED.block, created = EXCLUDED.created"
            }
            Self::TransactionUpsert => {
                "INSERT INTO transactions (block_num, hash, transaction, created) \
                 VALUES ($1, $2, $3, CAST($4 AS TIMESTAMPTZ)) \
                 ON CONFLICT (hash) DO UPDATE SET \
                 block_num = EXCLUDED.block_num, transaction = EXCLUDED.transaction, \
                 created = EXCLUDED.created"
            }
            Self::RewardInsert => {
                "INSERT INTO rewards (block_num, key, value, reward, created) \
                 VALUES ($1, $2, $3, $4, CAST($5 AS TIMESTAMPTZ)) \
                 ON CONFLICT (block_num, key) DO UPDATE SET \
                 value = EXCLUDED.value, reward = EXCLUDED.reward, created = EXCLUDED.created"
            }
            Self::StateUpsert => {
                "INSERT INTO state (block_num, key, value, created, updated) \
                 VALUES ($1, $2, $3, CAST($4 AS TIMESTAMPTZ), CAST($5 AS TIMESTAMPTZ)) \
                 ON CONFLICT (key) DO UPDATE SET \
                 block_num = EXCLUDED.block_num, value = EXCLUDED.value, \
                 updated = EXCLUDED.updated"
            }
            Self::ContractUpsert => {
                "INSERT INTO contracts (block_num, name, code, lst001, lst002, lst003, created) \
                 VALUES ($1, $2, $3, $4, $5, $6, CAST($7 AS TIMESTAMPTZ)) \
                 ON CONFLICT (name) DO UPDATE SET \
                 block_num = EXCLUDED.block_num, code = EXCLUDED.code, \
                 lst001 = EXCLUDED.lst001, lst002 = EXCLUDED.lst002, lst003 = EXCLUDED.lst003, \
                 created = EXCLUDED.created"
            }
            Self::AddressInsert => {
                "INSERT INTO addresses (block_num, address, created) \
                 VALUES ($1, $2, CAST($3 AS TIMESTAMPTZ)) \
                 ON CONFLICT (address) DO UPDATE SET \
                 block_num = EXCLUDED.block_num, created = EXCLUDED.created"
            }
            Self::BlockByNumber => "SELECT block FROM blocks WHERE number = $1",
            Self::BlockByHash => "SELECT block FROM blocks WHERE hash = $1",
            Self::StateBlockNum => "SELECT block_num FROM state WHERE key = $1",
            Self::AddressBlockNum => "SELECT block_num FROM addresses WHERE address = $1",
        }
    }
}
