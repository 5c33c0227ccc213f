/// 健康检查
pub mod health;

/// 载荷校验与格式化
pub mod payload;

/// 二维码渲染与批量生成
pub mod qr;
