// ==========================================
// 智能膳食订餐系统 - 仓储层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 约束: 约束冲突必须保留可判别类型, 上层据此区分
//       并发重复下单与真正的存储故障
// ==========================================

use rusqlite::ffi;
use thiserror::Error;

/// 仓储层错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("数据库锁获取失败: {0}")]
    LockError(String),

    #[error("数据库查询失败: {0}")]
    DatabaseQueryError(String),

    #[error("唯一约束违反: {0}")]
    UniqueConstraintViolation(String),

    #[error("外键约束违反: {0}")]
    ForeignKeyViolation(String),
}

impl RepositoryError {
    /// 是否为唯一约束冲突
    ///
    /// 并发场景下两次运行同时通过"待订餐"检查时, 后提交方
    /// 以此错误落败; 调用侧按单元失败处理, 不中止批次
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, RepositoryError::UniqueConstraintViolation(_))
    }
}

// SQLite 扩展错误码分流; 文本匹配不可靠 (约束名会出现在
// 普通查询错误里), 以 extended_code 为准
impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        if let rusqlite::Error::SqliteFailure(code, ref msg) = err {
            let text = msg.clone().unwrap_or_else(|| err.to_string());
            return match code.extended_code {
                ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY => {
                    RepositoryError::UniqueConstraintViolation(text)
                }
                ffi::SQLITE_CONSTRAINT_FOREIGNKEY => RepositoryError::ForeignKeyViolation(text),
                _ => RepositoryError::DatabaseQueryError(text),
            };
        }
        RepositoryError::DatabaseQueryError(err.to_string())
    }
}

/// Result 类型别名
pub type RepositoryResult<T> = Result<T, RepositoryError>;
