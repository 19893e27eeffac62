/// 경매 조회
pub const GET_AUCTION: &str = "SELECT * FROM auctions WHERE id = $1";

/// 공개 목록 조회 (승인 + 진행/일시 중지, 카테고리 선택)
pub const GET_PUBLIC_AUCTIONS: &str = r#"
    SELECT a.*, COALESCE(b.bid_count, 0) AS bid_count
    FROM auctions a
    LEFT JOIN (
        SELECT auction_id, COUNT(*) AS bid_count FROM bids GROUP BY auction_id
    ) b ON b.auction_id = a.id
    WHERE a.approval_status = 'approved'
      AND a.status IN ('active', 'paused')
      AND ($1::text IS NULL OR a.category = $1)
    ORDER BY a.end_time ASC
"#;

/// 최고 입찰 조회
pub const GET_HIGHEST_BID: &str = r#"
    SELECT bid_amount, user_id
    FROM bids
    WHERE auction_id = $1 AND status = 'active'
    ORDER BY bid_amount DESC, bid_time ASC
    LIMIT 1
"#;

/// 입찰 이력 조회 (금액 내림차순)
pub const GET_BID_HISTORY: &str = r#"
    SELECT id, auction_id, user_id, bid_amount, bid_time, status
    FROM bids
    WHERE auction_id = $1
    ORDER BY bid_amount DESC, bid_time DESC
"#;

/// 사용자 입찰 조회 (최신순)
pub const GET_USER_BIDS: &str = r#"
    SELECT id, auction_id, user_id, bid_amount, bid_time, status
    FROM bids
    WHERE user_id = $1
    ORDER BY bid_time DESC
"#;

/// 사용자 출품 조회
pub const GET_USER_SUBMISSIONS: &str =
    "SELECT * FROM auctions WHERE submitted_by = $1 ORDER BY created_at DESC";

/// 전체 경매 조회 (관리자)
pub const GET_ALL_AUCTIONS: &str = "SELECT * FROM auctions ORDER BY created_at DESC";

/// id 목록으로 경매 조회
pub const GET_AUCTIONS_BY_IDS: &str = "SELECT * FROM auctions WHERE id = ANY($1)";

/// 입찰 반영: 현재가 갱신
/// 동시에 들어온 더 높은 입찰이 먼저 반영되었다면 갱신되지 않는다.
pub const RAISE_CURRENT_BID: &str = r#"
    UPDATE auctions
    SET current_bid = $2, updated_at = now()
    WHERE id = $1
      AND status = 'active'
      AND approval_status = 'approved'
      AND end_time > now()
      AND current_bid + $3 <= $2
    RETURNING current_bid
"#;

/// 이전 최고 입찰 무효화
pub const SUPERSEDE_ACTIVE_BIDS: &str = r#"
    UPDATE bids SET status = 'superseded'
    WHERE auction_id = $1 AND status = 'active'
    RETURNING user_id
"#;

/// 입찰 추가
pub const INSERT_BID: &str = r#"
    INSERT INTO bids (id, auction_id, user_id, bid_amount, bid_time, status)
    VALUES ($1, $2, $3, $4, $5, 'active')
    RETURNING id, auction_id, user_id, bid_amount, bid_time, status
"#;

/// 종료 시각이 지난 경매 마감
pub const CLOSE_EXPIRED_AUCTIONS: &str = r#"
    UPDATE auctions SET status = 'ended', updated_at = now()
    WHERE status IN ('active', 'paused') AND end_time <= $1
    RETURNING id, approval_status
"#;

/// 경매별 최고 입찰 조회
pub const GET_BID_LEADERS: &str = r#"
    SELECT DISTINCT ON (auction_id) auction_id, bid_amount, user_id
    FROM bids
    WHERE auction_id = ANY($1) AND status = 'active'
    ORDER BY auction_id, bid_amount DESC, bid_time ASC
"#;
