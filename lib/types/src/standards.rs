//! Token-standard classification.
//!
//! These are heuristics, not a parser: the contract source is stripped of
//! space characters and searched for the literal signature fragments each
//! standard requires.

const LST001_FRAGMENTS: &[&str] = &[
    "balances=Hash(",
    "@export\ndeftransfer(amount:float,to:str)",
    "@export\ndefapprove(amount:float,to:str)",
    "@export\ndeftransfer_from(amount:float,to:str,main_account:str)",
];

const LST002_FRAGMENTS: &[&str] = &["metadata=Hash("];

const LST003_FRAGMENTS: &[&str] = &[
    "collection_name=Variable()",
    "collection_owner=Variable()",
    "collection_nfts=Hash(",
    "collection_balances=Hash(",
    "collection_balances_approvals=Hash(",
    "@export\ndefmint_nft(name:str,description:str,ipfs_image_url:str,metadata:dict,amount:int)",
    "@export\ndeftransfer(name:str,amount:int,to:str)",
    "@export\ndefapprove(amount:int,name:str,to:str)",
    "@export\ndeftransfer_from(name:str,amount:int,to:str,main_account:str)",
];

fn complies(code: &str, fragments: &[&str]) -> bool {
    let stripped = code.replace(' ', "");
    fragments.iter().all(|f| stripped.contains(f))
}

/// LST001: fungible token standard.
pub fn is_lst001(code: &str) -> bool {
    complies(code, LST001_FRAGMENTS)
}

/// LST002: token metadata extension.
pub fn is_lst002(code: &str) -> bool {
    complies(code, LST002_FRAGMENTS)
}

/// LST003: NFT collection standard.
pub fn is_lst003(code: &str) -> bool {
    complies(code, LST003_FRAGMENTS)
}
